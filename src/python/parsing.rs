use ruff_python_ast::Mod;
use ruff_python_parser::{parse, Mode};

use super::error::Result;

/// Parse Python source into an AST with the ruff parser.
pub fn parse_python_source(python_source: &str) -> Result<Mod> {
    Ok(parse(python_source, Mode::Module)?.into_syntax())
}
