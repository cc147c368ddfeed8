use std::path::Path;
use std::sync::Arc;

use crate::config::ModuleConfig;
use crate::filesystem::ProjectFile;
use crate::modules::ModuleNode;

use super::ignore_directive::IgnoreDirectives;
use super::import::NormalizedImport;

/// Per-file IR: the file, the module which contains it, and the first-party
/// imports found in it.
#[derive(Debug)]
pub struct FileModule {
    pub file: ProjectFile,
    pub module: Arc<ModuleNode>,
    pub file_mod_path: String,
    pub imports: Vec<NormalizedImport>,
    pub directive_ignored_imports: Vec<NormalizedImport>,
    pub ignore_directives: IgnoreDirectives,
}

impl FileModule {
    pub fn module_config(&self) -> &ModuleConfig {
        self.module
            .config
            .as_ref()
            .expect("terminal module nodes always carry config")
    }

    pub fn relative_file_path(&self) -> &Path {
        &self.file.relative_file_path
    }

    pub fn contents(&self) -> &str {
        &self.file.contents
    }
}
