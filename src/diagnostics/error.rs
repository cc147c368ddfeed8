use thiserror::Error;

use crate::filesystem::FileSystemError;
use crate::processors::import::ImportParseError;

#[derive(Error, Debug)]
pub enum DiagnosticError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FileSystemError),
    #[error("Import parsing error: {0}")]
    ImportParse(#[from] ImportParseError),
    #[error("Module containing '{0}' not found in project.")]
    ModuleNotFound(String),
}
