pub mod error;
pub mod parsing;

pub use error::ParsingError;
pub use parsing::{normalize_package_name, parse_pyproject_toml, parse_requirements_txt, ProjectInfo};
