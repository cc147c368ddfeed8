use std::path::PathBuf;

use crate::config::ModuleConfig;
use crate::processors::interface_members::parse_interface_members;

use super::error::ModuleTreeError;
use super::tree::ModuleTree;
use super::validation::{find_cycles, find_duplicate_modules};

/// Build the module tree from validated module configs.
///
/// Interface members are read from each module's package initializer so that
/// strict-mode checks can consult them without touching the filesystem again.
pub fn build_module_tree(
    source_roots: &[PathBuf],
    modules: Vec<ModuleConfig>,
    forbid_circular_dependencies: bool,
) -> Result<ModuleTree, ModuleTreeError> {
    let duplicate_modules = find_duplicate_modules(&modules);
    if !duplicate_modules.is_empty() {
        return Err(ModuleTreeError::DuplicateModules(
            duplicate_modules.iter().map(|s| s.to_string()).collect(),
        ));
    }

    if forbid_circular_dependencies {
        let cycles = find_cycles(&modules);
        if let Some(cycle) = cycles.into_iter().next() {
            return Err(ModuleTreeError::CircularDependency(cycle));
        }
    }

    let mut tree = ModuleTree::new();
    for module in modules {
        let mod_path = module.mod_path();
        let interface_members = parse_interface_members(source_roots, &mod_path)?;
        tree.insert(module, mod_path, interface_members)?;
    }

    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DependencyConfig;

    fn module(path: &str, depends_on: &[&str]) -> ModuleConfig {
        ModuleConfig {
            path: path.to_string(),
            depends_on: depends_on
                .iter()
                .map(|dep| DependencyConfig::from_path(*dep))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn builds_a_tree_from_configs() {
        let tree = build_module_tree(
            &[],
            vec![module("a", &["a.b"]), module("a.b", &[])],
            false,
        )
        .unwrap();
        assert_eq!(tree.get("a.b").unwrap().full_path, "a.b");
    }

    #[test]
    fn duplicate_modules_fail_the_build() {
        let result = build_module_tree(&[], vec![module("a", &[]), module("a", &[])], false);
        assert!(matches!(result, Err(ModuleTreeError::DuplicateModules(_))));
    }

    #[test]
    fn circular_dependencies_fail_the_build_when_forbidden() {
        let modules = vec![module("a", &["b"]), module("b", &["a"])];
        let result = build_module_tree(&[], modules.clone(), true);
        assert!(matches!(
            result,
            Err(ModuleTreeError::CircularDependency(cycle)) if cycle == vec!["a".to_string(), "b".to_string()]
        ));

        // The same graph builds fine when cycles are not forbidden
        assert!(build_module_tree(&[], modules, false).is_ok());
    }
}
