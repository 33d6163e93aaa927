#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core data structures for the flight-dynamics expression evaluation core.
//!
//! Four responsibilities, lowest-to-highest:
//! - [`registry`]: the Property Registry, a hierarchical path-addressed store
//!   of named scalar state.
//! - [`expr`]: the Expression Model, a tagged sum of constants, property
//!   references, operators, tables, and template calls.
//! - [`table`]: the Lookup Table Engine, 1D/2D/3D piecewise-linear
//!   interpolation with cached-index search.
//! - [`document`]: a minimal owned XML element tree shared by the crates
//!   that build expressions and scripts from configuration documents.
//!
//! None of these modules know about the script engine or the document
//! builder that sit above them.

pub mod document;
pub mod error;
pub mod expr;
pub mod registry;
pub mod table;

pub use error::EvalError;
pub use expr::{Expression, ExprKind, OperatorKind, Template};
pub use registry::{NodeId, PropertyAttrs, PropertyRef, PropertyRegistry, RegistryError};
pub use table::{Table, TableBuilder, TableError};
