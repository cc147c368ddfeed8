use std::path::PathBuf;

use ruff_python_ast::{Expr, Mod, Stmt};

use crate::filesystem::{self, PACKAGE_FILE_NAME};
use crate::python::error::Result;
use crate::python::parsing::parse_python_source;

/// Collect the string members of the first module-scope `__all__` assignment.
///
/// Only the top-level statement list is scanned; the walk halts at the first
/// matching assignment.
fn interface_members_from_ast(ast: &Mod) -> Vec<String> {
    let Mod::Module(module) = ast else {
        return vec![];
    };

    for stmt in &module.body {
        let Stmt::Assign(assign) = stmt else {
            continue;
        };
        let is_export_list = assign.targets.iter().any(|target| {
            matches!(target, Expr::Name(name) if name.id.as_str() == "__all__")
        });
        if !is_export_list {
            continue;
        }

        let Expr::List(list) = assign.value.as_ref() else {
            return vec![];
        };
        return list
            .elts
            .iter()
            .filter_map(|element| match element {
                Expr::StringLiteral(literal) => Some(literal.value.to_str().to_string()),
                _ => None,
            })
            .collect();
    }

    vec![]
}

/// Parse the interface members of the module at `module_path`.
///
/// Modules without a package initializer, and the root module, have no
/// interface members; that is an empty list, never an error.
pub fn parse_interface_members(
    source_roots: &[PathBuf],
    module_path: &str,
) -> Result<Vec<String>> {
    if module_path == "." {
        return Ok(vec![]);
    }

    let Some(resolved) = filesystem::module_to_file_path(source_roots, module_path, false) else {
        return Ok(vec![]);
    };
    if !resolved.file_path.ends_with(PACKAGE_FILE_NAME) {
        return Ok(vec![]);
    }

    let contents = filesystem::read_file_content(&resolved.file_path)?;
    let ast = parse_python_source(&contents)?;
    Ok(interface_members_from_ast(&ast))
}
