pub mod eval;
pub mod load;
pub mod run_script;

use std::path::Path;

use crate::error::CliError;

pub(crate) fn read_to_string(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_owned(),
        source,
    })
}
