//! `fdm eval <doc> <path>` — load a document and evaluate one registry path.

use std::path::Path;
use std::rc::Rc;

use fdm_core::{document, PropertyRegistry};

use super::read_to_string;
use crate::error::CliError;

pub fn run(doc_path: &Path, query_path: &str) -> Result<(), CliError> {
    let text = read_to_string(doc_path)?;
    let root = document::parse(&text)?;

    let registry = Rc::new(PropertyRegistry::new());
    fdm_config::build_document(&registry, &root)?;

    let node = registry
        .lookup_node(query_path)
        .ok_or_else(|| CliError::UnknownPath {
            path: query_path.to_owned(),
        })?;

    println!("{}", registry.read(node));
    Ok(())
}
