//! Failure kinds raised while loading or running a script.

use fdm_core::RegistryError;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ScriptError {
    /// A condition, action target, or comparison operand named a property
    /// that does not exist in the registry at script-load time.
    #[error("unresolved property: {path}")]
    UnresolvedProperty { path: String },

    #[error("malformed script: {detail}")]
    MalformedScript { detail: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
