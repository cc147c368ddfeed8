use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::ProjectConfig;
use crate::diagnostics::{
    sort_diagnostics, CodeDiagnostic, Diagnostic, DiagnosticDetails,
};
use crate::exclusion::{PathExclusionError, PathExclusions};
use crate::external::parsing::{normalize_package_name, parse_pyproject_toml};
use crate::external::ParsingError;
use crate::filesystem::{self, FileSystemError};
use crate::processors::import::{
    get_normalized_imports, is_project_import, ImportParseError,
};

#[derive(Error, Debug)]
pub enum ExternalCheckError {
    #[error("Parsing error: {0}")]
    Parse(#[from] ParsingError),
    #[error("Import parsing error: {0}")]
    ImportParse(#[from] ImportParseError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FileSystemError),
    #[error("Exclusion error: {0}")]
    Exclusion(#[from] PathExclusionError),
}

pub type Result<T> = std::result::Result<T, ExternalCheckError>;

// Not distributions, but always importable
const KNOWN_MODULE_SPECIAL_CASES: [&str; 2] = ["__future__", "typing_extensions"];

fn is_stdlib_module(python_version: u8, module: &str) -> bool {
    KNOWN_MODULE_SPECIAL_CASES.contains(&module)
        || ruff_python_stdlib::sys::is_known_standard_library(python_version, module)
}

/// Classify every non-first-party import under each package manifest as
/// standard-library, declared, or undeclared; also report declared
/// distributions which are never imported.
///
/// `module_mappings` maps importable top-level names to the distributions
/// providing them. `python_version` is the interpreter's minor version, used
/// for standard-library membership.
pub fn check_external_dependencies(
    project_root: &Path,
    project_config: &ProjectConfig,
    module_mappings: &HashMap<String, Vec<String>>,
    python_version: u8,
) -> Result<Vec<Diagnostic>> {
    let mut diagnostics = Vec::new();
    let source_roots: Vec<PathBuf> = project_config.prepend_roots(project_root);
    let exclusions = PathExclusions::new(
        project_root,
        &project_config.exclude,
        project_config.use_regex_matching,
    )?;
    let excluded_modules: HashSet<&str> = project_config
        .external
        .exclude
        .iter()
        .map(String::as_str)
        .collect();

    for pyproject in filesystem::walk_pyprojects(&project_root.display().to_string(), &exclusions)
    {
        let project_info = parse_pyproject_toml(&pyproject)?;
        let package_name = project_info
            .name
            .clone()
            .unwrap_or_else(|| pyproject.display().to_string());
        let mut unused_dependencies = project_info.dependencies.clone();

        for source_root in &project_info.source_paths {
            let mut reported: HashSet<(PathBuf, String)> = HashSet::new();
            for file_path in
                filesystem::walk_pyfiles(&source_root.display().to_string(), &exclusions)
            {
                let absolute_file_path = source_root.join(&file_path);
                let display_file_path =
                    filesystem::relative_to(&absolute_file_path, project_root)?;
                let file_contents = match filesystem::read_file_content(&absolute_file_path) {
                    Ok(contents) => contents,
                    Err(_) => continue,
                };
                let Ok(imports) = get_normalized_imports(
                    &source_roots,
                    &absolute_file_path,
                    &file_contents,
                    project_config.ignore_type_checking_imports,
                    project_config.include_string_imports,
                ) else {
                    continue;
                };

                for import in imports.imports {
                    if is_project_import(&source_roots, &import.module_path) {
                        continue;
                    }

                    let top_level_module_name = import.top_level_module_name();
                    if excluded_modules.contains(top_level_module_name) {
                        continue;
                    }
                    if is_stdlib_module(python_version, top_level_module_name) {
                        continue;
                    }

                    let default_distribution_names = vec![top_level_module_name.to_string()];
                    let distribution_names: Vec<String> = module_mappings
                        .get(top_level_module_name)
                        .unwrap_or(&default_distribution_names)
                        .iter()
                        .map(|dist_name| normalize_package_name(dist_name))
                        .collect();

                    for dist_name in distribution_names.iter() {
                        unused_dependencies.remove(dist_name);
                    }

                    let is_declared = distribution_names
                        .iter()
                        .any(|dist_name| project_info.dependencies.contains(dist_name));
                    if !is_declared
                        && reported.insert((
                            display_file_path.clone(),
                            top_level_module_name.to_string(),
                        ))
                    {
                        diagnostics.push(Diagnostic::new_located_error(
                            display_file_path.clone(),
                            import.line_no,
                            DiagnosticDetails::Code(CodeDiagnostic::UndeclaredExternalDependency {
                                dependency: top_level_module_name.to_string(),
                                package_name: package_name.clone(),
                            }),
                        ));
                    }
                }
            }
        }

        let manifest_path = filesystem::relative_to(&pyproject, project_root)?;
        for unused_dependency in unused_dependencies {
            diagnostics.push(Diagnostic::new_located_warning(
                manifest_path.clone(),
                1,
                DiagnosticDetails::Code(CodeDiagnostic::UnusedExternalDependency {
                    package_module_name: unused_dependency,
                    package_name: package_name.clone(),
                }),
            ));
        }
    }

    sort_diagnostics(&mut diagnostics);
    Ok(diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as stdfs;

    fn write_file(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        stdfs::create_dir_all(path.parent().unwrap()).unwrap();
        stdfs::write(path, contents).unwrap();
    }

    fn external_project() -> (tempfile::TempDir, ProjectConfig) {
        let scratch = tempfile::tempdir().unwrap();
        let root = scratch.path();
        write_file(
            root,
            "pyproject.toml",
            r#"
[project]
name = "widgets"
dependencies = ["GitPython", "attrs"]

[tool.setuptools]
packages = ["src"]
"#,
        );
        write_file(root, "src/widgets/__init__.py", "");
        write_file(
            root,
            "src/widgets/main.py",
            "import os\nimport git\nimport requests\nfrom widgets import helpers\n",
        );
        write_file(root, "src/widgets/helpers.py", "");

        let config = ProjectConfig {
            source_roots: vec![PathBuf::from("src")],
            exclude: vec![],
            ..Default::default()
        };
        (scratch, config)
    }

    fn git_module_mapping() -> HashMap<String, Vec<String>> {
        HashMap::from([("git".to_string(), vec!["GitPython".to_string()])])
    }

    #[test]
    fn undeclared_imports_are_reported_once_per_file() {
        let (scratch, config) = external_project();
        let diagnostics = check_external_dependencies(
            scratch.path(),
            &config,
            &git_module_mapping(),
            12,
        )
        .unwrap();

        let undeclared: Vec<_> = diagnostics
            .iter()
            .filter(|diagnostic| {
                matches!(
                    diagnostic.details(),
                    DiagnosticDetails::Code(CodeDiagnostic::UndeclaredExternalDependency { .. })
                )
            })
            .collect();
        assert_eq!(undeclared.len(), 1, "diagnostics: {:?}", diagnostics);
        assert_eq!(undeclared[0].dependency(), Some("requests"));
        assert_eq!(undeclared[0].line_number(), Some(3));
    }

    #[test]
    fn module_mappings_resolve_distribution_names() {
        let (scratch, config) = external_project();
        // Without the mapping, 'git' does not match the declared 'gitpython'
        let diagnostics =
            check_external_dependencies(scratch.path(), &config, &HashMap::new(), 12).unwrap();
        assert!(diagnostics.iter().any(|diagnostic| {
            diagnostic.dependency() == Some("git") && diagnostic.is_error()
        }));
    }

    #[test]
    fn declared_but_unimported_distributions_warn() {
        let (scratch, config) = external_project();
        let diagnostics = check_external_dependencies(
            scratch.path(),
            &config,
            &git_module_mapping(),
            12,
        )
        .unwrap();

        let unused: Vec<_> = diagnostics
            .iter()
            .filter(|diagnostic| {
                matches!(
                    diagnostic.details(),
                    DiagnosticDetails::Code(CodeDiagnostic::UnusedExternalDependency { .. })
                )
            })
            .collect();
        assert_eq!(unused.len(), 1, "diagnostics: {:?}", diagnostics);
        assert_eq!(unused[0].dependency(), Some("attrs"));
        assert!(unused[0].is_warning());
    }

    #[test]
    fn excluded_module_names_are_skipped() {
        let (scratch, mut config) = external_project();
        config.external.exclude = vec!["requests".to_string()];
        let diagnostics = check_external_dependencies(
            scratch.path(),
            &config,
            &git_module_mapping(),
            12,
        )
        .unwrap();
        assert!(diagnostics.iter().all(|diagnostic| !diagnostic.is_error()));
    }

    #[test]
    fn stdlib_imports_are_never_reported() {
        let (scratch, config) = external_project();
        let diagnostics = check_external_dependencies(
            scratch.path(),
            &config,
            &git_module_mapping(),
            12,
        )
        .unwrap();
        assert!(diagnostics
            .iter()
            .all(|diagnostic| diagnostic.dependency() != Some("os")));
    }
}
