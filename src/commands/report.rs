use std::cmp::Ordering;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::ProjectConfig;
use crate::exclusion::{PathExclusionError, PathExclusions};
use crate::filesystem::{file_to_module_path, walk_pyfiles, FileSystemError};
use crate::processors::import::{get_project_imports, ImportParseError, NormalizedImport};

struct Dependency {
    file_path: PathBuf,
    import: NormalizedImport,
}

#[derive(Error, Debug)]
pub enum ReportCreationError {
    #[error("I/O failure during report generation:\n{0}")]
    Io(#[from] io::Error),
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FileSystemError),
    #[error("Import parsing error: {0}")]
    ImportParse(#[from] ImportParseError),
    #[error("Exclusion error: {0}")]
    Exclusion(#[from] PathExclusionError),
    #[error("Nothing to report when skipping dependencies and usages.")]
    NothingToReport,
}

pub type Result<T> = std::result::Result<T, ReportCreationError>;

// less code than implementing/deriving all necessary traits for Ord
fn compare_dependencies(left: &Dependency, right: &Dependency) -> Ordering {
    let path_cmp = left.file_path.cmp(&right.file_path);
    if path_cmp == Ordering::Equal {
        return left.import.line_no.cmp(&right.import.line_no);
    }
    path_cmp
}

struct DependencyReport {
    path: String,
    pub dependencies: Vec<Dependency>,
    pub usages: Vec<Dependency>,
    pub warnings: Vec<String>,
}

impl DependencyReport {
    fn new(path: String) -> Self {
        DependencyReport {
            path,
            dependencies: vec![],
            usages: vec![],
            warnings: vec![],
        }
    }

    fn render_dependency(&self, dependency: &Dependency) -> String {
        format!(
            "{file_path}[L{line_no}]: Import '{import_mod_path}'",
            file_path = dependency.file_path.display(),
            line_no = dependency.import.line_no,
            import_mod_path = dependency.import.module_path
        )
    }

    fn render_section(&self, title: &str, dependencies: &[Dependency]) -> String {
        let display: String = match dependencies.len() {
            0 => "No dependencies found.".to_string(),
            _ => dependencies
                .iter()
                .map(|dep| self.render_dependency(dep))
                .collect::<Vec<String>>()
                .join("\n"),
        };
        format!(
            "[ {title} ]\n{display}\n-------------------------------\n",
            title = title,
            display = display,
        )
    }

    fn render_to_string(&mut self, skip_dependencies: bool, skip_usages: bool) -> String {
        let title = format!("Dependency Report for '{path}'", path = self.path.as_str());
        let mut result = format!(
            "[ {title} ]\n\
            -------------------------------\n",
            title = title,
        );

        if !skip_dependencies {
            self.dependencies.sort_by(compare_dependencies);
            result.push_str(&self.render_section(
                &format!("Dependencies of '{path}'", path = self.path.as_str()),
                &self.dependencies,
            ));
        }

        if !skip_usages {
            self.usages.sort_by(compare_dependencies);
            result.push_str(&self.render_section(
                &format!("Usages of '{path}'", path = self.path.as_str()),
                &self.usages,
            ));
        }

        if !self.warnings.is_empty() {
            result.push_str(&format!(
                "[ Warnings ]\n{warnings}\n",
                warnings = self.warnings.join("\n")
            ));
        }

        result
    }
}

/// Report every import crossing the boundary of the module at `path`:
/// imports from inside pointing out (dependencies) and imports from outside
/// pointing in (usages).
pub fn create_dependency_report(
    project_root: &Path,
    project_config: &ProjectConfig,
    path: &Path,
    include_dependency_modules: Option<Vec<String>>,
    include_usage_modules: Option<Vec<String>>,
    skip_dependencies: bool,
    skip_usages: bool,
) -> Result<String> {
    if skip_dependencies && skip_usages {
        return Err(ReportCreationError::NothingToReport);
    }

    // Canonical paths keep the prefix comparisons below valid
    let project_root = project_root.canonicalize()?;
    let source_roots: Vec<PathBuf> = project_config.prepend_roots(&project_root);
    let exclusions = PathExclusions::new(
        &project_root,
        &project_config.exclude,
        project_config.use_regex_matching,
    )?;
    let absolute_path = project_root.join(path).canonicalize()?;
    let module_path = file_to_module_path(&source_roots, &absolute_path)?;
    let mut report = DependencyReport::new(path.to_string_lossy().to_string());

    for source_root in &source_roots {
        for pyfile in walk_pyfiles(&source_root.display().to_string(), &exclusions) {
            let absolute_pyfile = source_root.join(&pyfile);
            match get_project_imports(
                &source_roots,
                &absolute_pyfile,
                project_config.ignore_type_checking_imports,
                project_config.include_string_imports,
            ) {
                Ok(project_imports) => {
                    let pyfile_in_target_module = absolute_pyfile.starts_with(&absolute_path);
                    if pyfile_in_target_module && !skip_dependencies {
                        // Imports from within the target which point elsewhere
                        // are its dependencies
                        report.dependencies.extend(
                            project_imports
                                .imports
                                .into_iter()
                                .filter(|import| {
                                    if import.module_path.starts_with(&module_path) {
                                        // an internal import
                                        return false;
                                    }

                                    include_dependency_modules.as_ref().map_or(
                                        true,
                                        |included_modules| {
                                            included_modules.iter().any(|module_path| {
                                                import.module_path.starts_with(module_path)
                                            })
                                        },
                                    )
                                })
                                .map(|import| Dependency {
                                    file_path: pyfile.clone(),
                                    import,
                                }),
                        );
                    } else if !pyfile_in_target_module && !skip_usages {
                        // Imports from outside which point into the target
                        // are its usages
                        for import in project_imports.imports {
                            if !import.module_path.starts_with(&module_path) {
                                continue;
                            }

                            let Ok(pyfile_mod_path) =
                                file_to_module_path(&source_roots, &absolute_pyfile)
                            else {
                                continue;
                            };

                            if include_usage_modules.as_ref().map_or(
                                true,
                                |included_modules| included_modules.contains(&pyfile_mod_path),
                            ) {
                                report.usages.push(Dependency {
                                    file_path: pyfile.clone(),
                                    import,
                                });
                            }
                        }
                    }
                }
                Err(err) => {
                    report.warnings.push(err.to_string());
                }
            }
        }
    }
    Ok(report.render_to_string(skip_dependencies, skip_usages))
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

    fn report_project() -> (tempfile::TempDir, ProjectConfig) {
        let scratch = tempfile::tempdir().unwrap();
        let root = scratch.path();
        write_file(root, "src/core/__init__.py", "");
        write_file(root, "src/core/db.py", "import util\n");
        write_file(root, "src/api/__init__.py", "from core.db import connect\n");
        write_file(root, "src/util.py", "");

        let config = ProjectConfig {
            source_roots: vec![PathBuf::from("src")],
            exclude: vec![],
            ..Default::default()
        };
        (scratch, config)
    }

    #[test]
    fn report_lists_dependencies_and_usages() {
        let (scratch, config) = report_project();
        let report = create_dependency_report(
            scratch.path(),
            &config,
            Path::new("src/core"),
            None,
            None,
            false,
            false,
        )
        .unwrap();

        assert!(report.contains("Dependencies of 'src/core'"));
        assert!(report.contains("Import 'util'"));
        assert!(report.contains("Usages of 'src/core'"));
        assert!(report.contains("Import 'core.db.connect'"));
    }

    #[test]
    fn usage_filters_restrict_the_report() {
        let (scratch, config) = report_project();
        let report = create_dependency_report(
            scratch.path(),
            &config,
            Path::new("src/core"),
            None,
            Some(vec!["unrelated".to_string()]),
            true,
            false,
        )
        .unwrap();

        assert!(!report.contains("Import 'core.db.connect'"));
    }

    #[test]
    fn skipping_everything_is_an_error() {
        let (scratch, config) = report_project();
        let result = create_dependency_report(
            scratch.path(),
            &config,
            Path::new("src/core"),
            None,
            None,
            true,
            true,
        );
        assert!(matches!(result, Err(ReportCreationError::NothingToReport)));
    }
}
