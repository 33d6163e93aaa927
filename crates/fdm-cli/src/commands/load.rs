//! `fdm load <doc>` — parse a configuration document and report the
//! functions it publishes.

use std::path::Path;
use std::rc::Rc;

use fdm_core::{document, PropertyRegistry};

use super::read_to_string;
use crate::error::CliError;

pub fn run(doc_path: &Path) -> Result<(), CliError> {
    let text = read_to_string(doc_path)?;
    let root = document::parse(&text)?;

    let registry = Rc::new(PropertyRegistry::new());
    let built = fdm_config::build_document(&registry, &root)?;

    println!("published {} function(s):", built.len());
    for f in &built {
        println!("  {}", f.name);
    }
    Ok(())
}
