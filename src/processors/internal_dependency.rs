use std::path::PathBuf;

use ruff_source_file::LineIndex;

use crate::config::ProjectConfig;
use crate::diagnostics::{DiagnosticError, FileProcessor, Result as DiagnosticResult};
use crate::filesystem::{self, ProjectFile};
use crate::modules::ModuleTree;
use crate::python::parsing::parse_python_source;

use super::file_module::FileModule;
use super::ignore_directive::get_ignore_directives;
use super::import::{
    get_normalized_imports_from_ast, is_project_import, ImportParseError, NormalizedImport,
};

/// Turns a project file into its [`FileModule`] IR: resolves the containing
/// module, extracts first-party imports, and records ignore directives.
pub struct InternalDependencyExtractor<'a> {
    source_roots: &'a [PathBuf],
    module_tree: &'a ModuleTree,
    project_config: &'a ProjectConfig,
}

impl<'a> InternalDependencyExtractor<'a> {
    pub fn new(
        source_roots: &'a [PathBuf],
        module_tree: &'a ModuleTree,
        project_config: &'a ProjectConfig,
    ) -> Self {
        Self {
            source_roots,
            module_tree,
            project_config,
        }
    }

    fn keep_first_party(&self, imports: Vec<NormalizedImport>) -> Vec<NormalizedImport> {
        imports
            .into_iter()
            .filter(|import| is_project_import(self.source_roots, &import.module_path))
            .collect()
    }
}

impl<'a> FileProcessor<'a, ProjectFile> for InternalDependencyExtractor<'a> {
    type ProcessedFile = FileModule;

    fn process(&'a self, file: ProjectFile) -> DiagnosticResult<Self::ProcessedFile> {
        let file_mod_path = filesystem::file_to_module_path(self.source_roots, &file.file_path)?;
        let module = self
            .module_tree
            .find_nearest(&file_mod_path)
            .ok_or_else(|| DiagnosticError::ModuleNotFound(file_mod_path.clone()))?;

        let file_ast =
            parse_python_source(&file.contents).map_err(|err| ImportParseError::Parsing {
                file: file.file_path.display().to_string(),
                source: err,
            })?;
        let line_index = LineIndex::from_source_text(&file.contents);
        let ignore_directives = get_ignore_directives(&file.contents);

        let normalized_imports = get_normalized_imports_from_ast(
            self.source_roots,
            &file.file_path,
            &file_ast,
            &line_index,
            &ignore_directives,
            self.project_config.ignore_type_checking_imports,
            self.project_config.include_string_imports,
        );

        Ok(FileModule {
            imports: self.keep_first_party(normalized_imports.imports),
            directive_ignored_imports: self
                .keep_first_party(normalized_imports.directive_ignored_imports),
            file,
            module,
            file_mod_path,
            ignore_directives,
        })
    }
}
