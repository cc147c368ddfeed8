pub mod config;
pub mod error;

pub use config::{dump_project_config_to_toml, parse_project_config};
pub use error::ParsingError;
