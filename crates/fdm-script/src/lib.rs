#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! The Script Engine: a `when`/`condition`/`action` state machine that
//! drives the simulation clock and fires guarded property writes.

pub mod builder;
pub mod engine;
pub mod error;
pub mod model;

pub use builder::build_script;
pub use engine::{load_script, ScriptEngine, TickReport};
pub use error::ScriptError;
pub use model::{Action, ActionKind, Comparator, Condition, Operand, Script, WhenBlock};
