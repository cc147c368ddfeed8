use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParsingError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ParsingError>;
