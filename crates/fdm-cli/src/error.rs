use std::path::PathBuf;

/// Aggregated failure surface for the CLI binary: every library error
/// this harness can hit, plus the I/O it performs on their behalf.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error(transparent)]
    Document(#[from] fdm_core::document::DocumentError),

    #[error(transparent)]
    Build(#[from] fdm_config::BuildError),

    #[error(transparent)]
    Script(#[from] fdm_script::ScriptError),

    #[error(transparent)]
    Eval(#[from] fdm_core::EvalError),

    #[error("no such registry path: {path}")]
    UnknownPath { path: String },
}
