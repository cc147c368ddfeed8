use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use thiserror::Error;

use crate::checks::{IgnoreDirectivePostProcessor, ImportChecker};
use crate::config::{ConfigError, ProjectConfig};
use crate::diagnostics::{
    sort_diagnostics, ConfigurationDiagnostic, Diagnostic, DiagnosticDetails, DiagnosticError,
    DiagnosticPipeline, FileChecker, FileProcessor, Result as DiagnosticResult,
};
use crate::exclusion::{PathExclusionError, PathExclusions};
use crate::filesystem::{self as fs, FileReadCache, FileSystemError, ProjectFile};
use crate::interrupt::check_interrupt;
use crate::modules::{build_module_tree, ModuleTreeError};
use crate::processors::{FileModule, InternalDependencyExtractor};

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("The path {0} is not a valid directory.")]
    InvalidDirectory(String),
    #[error("No checks enabled.")]
    NoChecksEnabled(),
    #[error("Invalid project configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FileSystemError),
    #[error("Module tree error: {0}")]
    ModuleTree(#[from] ModuleTreeError),
    #[error("Exclusion error: {0}")]
    Exclusion(#[from] PathExclusionError),
    #[error("Invalid visibility pattern: {0}")]
    VisibilityPattern(#[from] globset::Error),
    #[error("Operation cancelled by user")]
    Interrupt,
}

pub type Result<T> = std::result::Result<T, CheckError>;

struct CheckPipeline<'a> {
    found_imports: &'a AtomicBool,
    dependency_extractor: InternalDependencyExtractor<'a>,
    import_checker: ImportChecker<'a>,
    ignore_directive_post_processor: IgnoreDirectivePostProcessor,
}

impl<'a> FileProcessor<'a, ProjectFile> for CheckPipeline<'a> {
    type ProcessedFile = FileModule;

    fn process(&'a self, file: ProjectFile) -> DiagnosticResult<Self::ProcessedFile> {
        let file_module = self.dependency_extractor.process(file)?;

        if !file_module.imports.is_empty() && !self.found_imports.load(Ordering::Relaxed) {
            // Only write when unset, avoiding cache-line contention
            self.found_imports.store(true, Ordering::Relaxed);
        }

        Ok(file_module)
    }
}

impl<'a> FileChecker<'a> for CheckPipeline<'a> {
    type ProcessedFile = FileModule;
    type Output = Vec<Diagnostic>;

    fn check(&'a self, processed_file: &Self::ProcessedFile) -> DiagnosticResult<Self::Output> {
        let mut diagnostics = self.import_checker.check(processed_file)?;
        diagnostics.extend(
            self.ignore_directive_post_processor
                .check(processed_file),
        );
        Ok(diagnostics)
    }
}

fn skip_file_diagnostic(error: &DiagnosticError, file_path: &std::path::Path) -> Diagnostic {
    let file_path = file_path.display().to_string();
    match error {
        DiagnosticError::ImportParse(_) => Diagnostic::new_global_warning(
            DiagnosticDetails::Configuration(ConfigurationDiagnostic::SkippedFileSyntaxError {
                file_path,
            }),
        ),
        DiagnosticError::ModuleNotFound(module_path) => Diagnostic::new_global_error(
            DiagnosticDetails::Configuration(ConfigurationDiagnostic::ModuleNotFound {
                file_mod_path: module_path.clone(),
            }),
        ),
        _ => Diagnostic::new_global_warning(DiagnosticDetails::Configuration(
            ConfigurationDiagnostic::SkippedFileIoError { file_path },
        )),
    }
}

/// Check every source file under every source root against the configured
/// boundaries.
///
/// Parsing and checking run in parallel over the immutable module tree; the
/// returned diagnostics are deterministically ordered regardless of worker
/// scheduling.
pub fn check(
    project_root: PathBuf,
    project_config: &ProjectConfig,
    dependencies: bool,
    interfaces: bool,
) -> Result<Vec<Diagnostic>> {
    if !dependencies && !interfaces {
        return Err(CheckError::NoChecksEnabled());
    }

    if !project_root.is_dir() {
        return Err(CheckError::InvalidDirectory(
            project_root.display().to_string(),
        ));
    }

    project_config.validate()?;

    let mut final_diagnostics = Vec::new();
    let found_imports = AtomicBool::new(false);
    let source_roots: Vec<PathBuf> = project_config.prepend_roots(&project_root);
    let (valid_modules, invalid_modules) =
        fs::validate_project_modules(&source_roots, project_config.modules.clone());

    for module in &invalid_modules {
        final_diagnostics.push(Diagnostic::new_global_warning(
            DiagnosticDetails::Configuration(ConfigurationDiagnostic::ModuleNotOnDisk {
                module_path: module.path.clone(),
            }),
        ));
    }

    check_interrupt().map_err(|_| CheckError::Interrupt)?;
    let module_tree = build_module_tree(
        &source_roots,
        valid_modules,
        project_config.forbid_circular_dependencies,
    )?;

    let exclusions = PathExclusions::new(
        &project_root,
        &project_config.exclude,
        project_config.use_regex_matching,
    )?;
    let file_cache = FileReadCache::new(&project_root);

    let pipeline = CheckPipeline {
        found_imports: &found_imports,
        dependency_extractor: InternalDependencyExtractor::new(
            &source_roots,
            &module_tree,
            project_config,
        ),
        import_checker: ImportChecker::try_new(
            project_config,
            &module_tree,
            dependencies,
            interfaces,
        )?,
        ignore_directive_post_processor: IgnoreDirectivePostProcessor::new(),
    };

    let diagnostics: Vec<Diagnostic> = source_roots
        .par_iter()
        .flat_map(|source_root| {
            fs::walk_pyfiles(&source_root.display().to_string(), &exclusions)
                .par_bridge()
                .flat_map(|file_path| {
                    if check_interrupt().is_err() {
                        // Short-circuits remaining files; the interrupt is
                        // surfaced after the parallel section
                        return vec![];
                    }

                    let project_file = match ProjectFile::try_new(
                        &project_root,
                        source_root,
                        &file_path,
                        &file_cache,
                    ) {
                        Ok(project_file) => project_file,
                        Err(_) => {
                            return vec![Diagnostic::new_global_warning(
                                DiagnosticDetails::Configuration(
                                    ConfigurationDiagnostic::SkippedFileIoError {
                                        file_path: file_path.display().to_string(),
                                    },
                                ),
                            )]
                        }
                    };

                    match pipeline.diagnostics(project_file) {
                        Ok(diagnostics) => diagnostics,
                        Err(error) => vec![skip_file_diagnostic(&error, &file_path)],
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect();

    if check_interrupt().is_err() {
        return Err(CheckError::Interrupt);
    }

    final_diagnostics.extend(diagnostics);
    if !found_imports.load(Ordering::Relaxed) {
        final_diagnostics.push(Diagnostic::new_global_warning(
            DiagnosticDetails::Configuration(ConfigurationDiagnostic::NoFirstPartyImportsFound()),
        ));
    }

    sort_diagnostics(&mut final_diagnostics);
    Ok(final_diagnostics)
}
