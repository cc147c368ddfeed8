use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::{
    ConfigEdit, ConfigEditor, DependencyConfig, EditError, ProjectConfig, UnusedDependencies,
};
use crate::diagnostics::{CodeDiagnostic, Diagnostic, DiagnosticDetails};
use crate::filesystem::{self as fs, FileSystemError};

use super::check::{check, CheckError};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to write project configuration to file.\n{0}")]
    FileWrite(#[from] std::io::Error),
    #[error("Failed to serialize project configuration to TOML.\n{0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Failed to check the project during sync.\n{0}")]
    Check(#[from] CheckError),
    #[error("Failed to apply edits to project configuration.\n{0}")]
    Edit(#[from] EditError),
    #[error("Filesystem error during sync.\n{0}")]
    Filesystem(#[from] FileSystemError),
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// Dependencies in use per module, read off the checker's dependency errors.
///
/// Layer violations are excluded: declaring the dependency would not resolve
/// them, so sync must not offer it.
fn detect_dependencies(diagnostics: &[Diagnostic]) -> HashMap<String, Vec<String>> {
    let mut dependencies: HashMap<String, Vec<String>> = HashMap::new();
    for diagnostic in diagnostics {
        if let DiagnosticDetails::Code(
            CodeDiagnostic::UndeclaredDependency {
                usage_module,
                definition_module,
                ..
            }
            | CodeDiagnostic::DeprecatedDependency {
                usage_module,
                definition_module,
                ..
            },
        ) = diagnostic.details()
        {
            dependencies
                .entry(usage_module.clone())
                .or_default()
                .push(definition_module.clone());
        }
    }
    dependencies
}

fn deprecation_map(project_config: &ProjectConfig) -> HashMap<String, Vec<String>> {
    let mut deprecations: HashMap<String, Vec<String>> = HashMap::new();
    for module in &project_config.modules {
        for dependency in module.dependencies_iter() {
            if dependency.deprecated {
                deprecations
                    .entry(module.path.clone())
                    .or_default()
                    .push(dependency.path.clone());
            }
        }
    }
    deprecations
}

/// Update the project configuration with dependencies detected in the code.
///
/// With `prune`, declared dependencies are first cleared and modules missing
/// on disk are dropped, so the result is the minimal declaration set
/// consistent with the code. Previously deprecated dependencies keep their
/// deprecation marker either way.
pub fn sync_dependency_constraints(
    project_root: PathBuf,
    project_config: &ProjectConfig,
    prune: bool,
) -> Result<ProjectConfig> {
    let deprecations = deprecation_map(project_config);

    let mut new_project_config = if prune {
        let source_roots: Vec<PathBuf> = project_config.prepend_roots(&project_root);
        let existing_modules = project_config
            .modules
            .iter()
            .filter(|module| {
                module.is_root()
                    || fs::module_to_pyfile_or_dir_path(&source_roots, &module.path).is_some()
            })
            .map(|module| module.with_dependencies_removed())
            .collect();
        project_config.with_modules(existing_modules)
    } else {
        project_config.clone()
    };

    let check_result = check(project_root, &new_project_config, true, false)?;
    for (source_path, dependency_paths) in detect_dependencies(&check_result) {
        for dependency_path in dependency_paths {
            let deprecated = deprecations
                .get(&source_path)
                .is_some_and(|deps| deps.contains(&dependency_path));
            let dependency = if deprecated {
                DependencyConfig::from_deprecated_path(dependency_path)
            } else {
                DependencyConfig::from_path(dependency_path)
            };
            new_project_config.add_dependency_to_module(&source_path, dependency);
        }
    }

    Ok(new_project_config)
}

/// Declared dependencies not exercised by any import, per module.
///
/// This diffs the current declarations against a pruned sync; `exact` mode
/// reports these as errors. Unused deprecated dependencies are reported like
/// any other unused dependency.
pub fn detect_unused_dependencies(
    project_root: PathBuf,
    project_config: &ProjectConfig,
) -> Result<Vec<UnusedDependencies>> {
    let pruned_config = sync_dependency_constraints(project_root, project_config, true)?;
    Ok(pruned_config.compare_dependencies(project_config))
}

fn queue_module_edits(
    editor: &mut ConfigEditor,
    original: &ProjectConfig,
    updated: &ProjectConfig,
    prune: bool,
) {
    let updated_paths: HashSet<&String> =
        updated.modules.iter().map(|module| &module.path).collect();

    for module in &updated.modules {
        let original_dependencies: HashSet<&String> = original
            .dependencies_for_module(&module.path)
            .map(|deps| deps.iter().map(|dep| &dep.path).collect())
            .unwrap_or_default();

        for dependency in module.dependencies_iter() {
            if !original_dependencies.contains(&dependency.path) {
                editor.enqueue(ConfigEdit::AddDependency {
                    path: module.path.clone(),
                    dependency: dependency.path.clone(),
                    deprecated: dependency.deprecated,
                });
            }
        }

        if prune {
            let updated_dependencies: HashSet<&String> =
                module.dependencies_iter().map(|dep| &dep.path).collect();
            for dependency_path in original_dependencies {
                if !updated_dependencies.contains(dependency_path) {
                    editor.enqueue(ConfigEdit::RemoveDependency {
                        path: module.path.clone(),
                        dependency: dependency_path.clone(),
                    });
                }
            }
        }
    }

    if prune {
        for module in &original.modules {
            if !updated_paths.contains(&module.path) {
                editor.enqueue(ConfigEdit::DeleteModule {
                    path: module.path.clone(),
                });
            }
        }
    }
}

/// Sync the configuration file with the code.
///
/// With `add`, missing dependency declarations are added and nothing is
/// removed; otherwise the declarations are pruned down to the detected set.
pub fn sync_project(
    project_root: PathBuf,
    config_path: &Path,
    project_config: &ProjectConfig,
    add: bool,
) -> Result<()> {
    let prune = !add;
    let new_project_config =
        sync_dependency_constraints(project_root, project_config, prune)?;

    let mut editor = ConfigEditor::new();
    queue_module_edits(&mut editor, project_config, &new_project_config, prune);
    editor.apply(config_path)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModuleConfig;
    use crate::parsing::config::parse_project_config;
    use std::fs as stdfs;

    fn write_file(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        stdfs::create_dir_all(path.parent().unwrap()).unwrap();
        stdfs::write(path, contents).unwrap();
    }

    /// a -> b on disk; config declares a -> c (unused) and nothing else.
    fn project_on_disk() -> (tempfile::TempDir, ProjectConfig) {
        let scratch = tempfile::tempdir().unwrap();
        let root = scratch.path();
        write_file(root, "src/a/__init__.py", "");
        write_file(root, "src/a/main.py", "from b import helper\n");
        write_file(root, "src/b/__init__.py", "helper = 1\n");
        write_file(root, "src/c/__init__.py", "");

        let config = ProjectConfig {
            modules: vec![
                ModuleConfig {
                    path: "a".to_string(),
                    depends_on: vec![DependencyConfig::from_path("c")],
                    ..Default::default()
                },
                ModuleConfig::new("b", false),
                ModuleConfig::new("c", false),
            ],
            source_roots: vec![PathBuf::from("src")],
            ..Default::default()
        };
        (scratch, config)
    }

    #[test]
    fn additive_sync_declares_detected_dependencies() {
        let (scratch, config) = project_on_disk();
        let synced =
            sync_dependency_constraints(scratch.path().to_path_buf(), &config, false).unwrap();

        let deps = synced.dependencies_for_module("a").unwrap();
        assert!(deps.iter().any(|dep| dep.path == "b"));
        // additive sync never removes
        assert!(deps.iter().any(|dep| dep.path == "c"));
    }

    #[test]
    fn synced_projects_check_clean() {
        let (scratch, config) = project_on_disk();
        let synced =
            sync_dependency_constraints(scratch.path().to_path_buf(), &config, false).unwrap();

        let diagnostics = check(scratch.path().to_path_buf(), &synced, true, false).unwrap();
        assert!(
            diagnostics
                .iter()
                .all(|diagnostic| !diagnostic.is_dependency_error()),
            "diagnostics: {:?}",
            diagnostics
        );
    }

    #[test]
    fn prune_drops_unused_dependencies() {
        let (scratch, config) = project_on_disk();
        let pruned =
            sync_dependency_constraints(scratch.path().to_path_buf(), &config, true).unwrap();

        let deps = pruned.dependencies_for_module("a").unwrap();
        assert_eq!(deps, &vec![DependencyConfig::from_path("b")]);
    }

    #[test]
    fn prune_preserves_deprecation_markers() {
        let (scratch, mut config) = project_on_disk();
        config.modules[0].depends_on = vec![DependencyConfig::from_deprecated_path("b")];

        let pruned =
            sync_dependency_constraints(scratch.path().to_path_buf(), &config, true).unwrap();
        assert_eq!(
            pruned.dependencies_for_module("a").unwrap(),
            &vec![DependencyConfig::from_deprecated_path("b")]
        );
    }

    #[test]
    fn unused_dependencies_are_detected() {
        let (scratch, config) = project_on_disk();
        let unused = detect_unused_dependencies(scratch.path().to_path_buf(), &config).unwrap();

        assert_eq!(unused.len(), 1);
        assert_eq!(unused[0].path, "a");
        assert_eq!(
            unused[0].dependencies,
            vec![DependencyConfig::from_path("c")]
        );
    }

    #[test]
    fn sync_project_rewrites_the_config_file() {
        let (scratch, config) = project_on_disk();
        let config_path = scratch.path().join("fence.toml");
        stdfs::write(
            &config_path,
            r#"
# boundaries
source_roots = ["src"]

[[modules]]
path = "a"
depends_on = ["c"]

[[modules]]
path = "b"

[[modules]]
path = "c"
"#,
        )
        .unwrap();

        sync_project(scratch.path().to_path_buf(), &config_path, &config, false).unwrap();

        let (reloaded, _) = parse_project_config(&config_path).unwrap();
        assert_eq!(
            reloaded.dependencies_for_module("a").unwrap(),
            &vec![DependencyConfig::from_path("b")]
        );
        let rewritten = stdfs::read_to_string(&config_path).unwrap();
        assert!(rewritten.contains("# boundaries"));
    }
}
