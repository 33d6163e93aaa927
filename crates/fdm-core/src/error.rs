//! Error kinds shared by the registry, expression, and table modules.

use crate::registry::RegistryError;
use crate::table::TableError;

/// Failure raised while evaluating an expression tree.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EvalError {
    /// Division, domain, or other numeric failure inside an operator.
    #[error("numeric failure in {op}: {detail}")]
    NumericFailure { op: &'static str, detail: String },

    /// A table-bound axis or its interpolation failed.
    #[error(transparent)]
    Table(#[from] TableError),

    /// The registry refused a read or write this evaluation depended on.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
