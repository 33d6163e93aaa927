//! Failure kinds raised while building expressions and tables from a
//! configuration document.

use fdm_core::{RegistryError, TableError};

#[derive(Debug, Clone, thiserror::Error)]
pub enum BuildError {
    #[error("malformed document at <{element}>: {detail}")]
    MalformedDocument { element: String, detail: String },

    #[error("unknown operator tag <{tag}>")]
    UnknownOperator { tag: String },

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
