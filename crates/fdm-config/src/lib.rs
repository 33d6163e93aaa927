#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! The Expression Builder: turns a parsed configuration document into
//! published [`fdm_core::Expression`] trees and [`fdm_core::Table`]s.
//!
//! Document parsing itself lives in `fdm_core::document` so that this
//! crate and `fdm-script` can share it without depending on each other.

pub mod builder;
pub mod error;

pub use builder::{build_document, build_function, build_table, BuiltFunction};
pub use error::BuildError;
