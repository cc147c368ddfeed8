use std::fs;
use std::io::Write;
use std::path::Path;

use thiserror::Error;
use toml_edit::{value, Array, ArrayOfTables, DocumentMut, InlineTable, Item, Table, Value};

#[derive(Error, Debug)]
pub enum EditError {
    #[error("Failed to parse TOML document.\n{0}")]
    TomlParse(#[from] toml_edit::TomlError),
    #[error("I/O failure during config edit.\n{0}")]
    Io(#[from] std::io::Error),
    #[error("Unexpected structure in config document.")]
    UnexpectedStructure,
}

pub type Result<T> = std::result::Result<T, EditError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigEdit {
    CreateModule { path: String },
    DeleteModule { path: String },
    AddDependency {
        path: String,
        dependency: String,
        deprecated: bool,
    },
    RemoveDependency { path: String, dependency: String },
}

/// Applies queued edits to a config document in place, preserving
/// comments and formatting outside the touched entries.
#[derive(Debug, Default)]
pub struct ConfigEditor {
    edits: Vec<ConfigEdit>,
}

fn dependency_matches(entry: &Value, dependency: &str) -> bool {
    match entry {
        Value::String(path) => path.value() == dependency,
        Value::InlineTable(table) => table
            .get("path")
            .and_then(|path| path.as_str())
            .map(|path| path == dependency)
            .unwrap_or(false),
        _ => false,
    }
}

fn module_tables(doc: &mut DocumentMut) -> Result<&mut ArrayOfTables> {
    doc.entry("modules")
        .or_insert(Item::ArrayOfTables(ArrayOfTables::new()))
        .as_array_of_tables_mut()
        .ok_or(EditError::UnexpectedStructure)
}

fn find_module_table<'a>(
    modules: &'a mut ArrayOfTables,
    path: &str,
) -> Option<&'a mut Table> {
    modules.iter_mut().find(|table| {
        table
            .get("path")
            .and_then(|item| item.as_str())
            .map(|module_path| module_path == path)
            .unwrap_or(false)
    })
}

impl ConfigEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, edit: ConfigEdit) {
        self.edits.push(edit);
    }

    pub fn has_edits(&self) -> bool {
        !self.edits.is_empty()
    }

    pub fn edits(&self) -> &[ConfigEdit] {
        &self.edits
    }

    /// Apply all queued edits to the document at `config_path`.
    ///
    /// The rewrite goes through a temporary file in the same directory, so a
    /// failed write never leaves a truncated config behind.
    pub fn apply(&self, config_path: &Path) -> Result<()> {
        if self.edits.is_empty() {
            return Ok(());
        }

        let content = fs::read_to_string(config_path)?;
        let mut doc: DocumentMut = content.parse()?;

        for edit in &self.edits {
            self.apply_edit(&mut doc, edit)?;
        }

        let parent = config_path.parent().unwrap_or(Path::new("."));
        let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
        temp_file.write_all(doc.to_string().as_bytes())?;
        temp_file
            .persist(config_path)
            .map_err(|persist_error| EditError::Io(persist_error.error))?;
        Ok(())
    }

    fn apply_edit(&self, doc: &mut DocumentMut, edit: &ConfigEdit) -> Result<()> {
        let modules = module_tables(doc)?;
        match edit {
            ConfigEdit::CreateModule { path } => {
                if find_module_table(modules, path).is_none() {
                    let mut table = Table::new();
                    table["path"] = value(path.as_str());
                    table["depends_on"] = value(Array::new());
                    modules.push(table);
                }
                Ok(())
            }
            ConfigEdit::DeleteModule { path } => {
                modules.retain(|table| {
                    table
                        .get("path")
                        .and_then(|item| item.as_str())
                        .map(|module_path| module_path != path)
                        .unwrap_or(true)
                });
                Ok(())
            }
            ConfigEdit::AddDependency {
                path,
                dependency,
                deprecated,
            } => {
                let index = modules.iter().position(|table| {
                    table
                        .get("path")
                        .and_then(|item| item.as_str())
                        .map(|module_path| module_path == path)
                        .unwrap_or(false)
                });
                let index = match index {
                    Some(index) => index,
                    None => {
                        let mut table = Table::new();
                        table["path"] = value(path.as_str());
                        table["depends_on"] = value(Array::new());
                        modules.push(table);
                        modules.len() - 1
                    }
                };
                let table = modules
                    .get_mut(index)
                    .ok_or(EditError::UnexpectedStructure)?;
                let dependencies = table
                    .entry("depends_on")
                    .or_insert(value(Array::new()))
                    .as_array_mut()
                    .ok_or(EditError::UnexpectedStructure)?;
                if !dependencies
                    .iter()
                    .any(|entry| dependency_matches(entry, dependency))
                {
                    if *deprecated {
                        let mut entry = InlineTable::new();
                        entry.insert("path", Value::from(dependency.as_str()));
                        entry.insert("deprecated", Value::from(true));
                        dependencies.push(Value::InlineTable(entry));
                    } else {
                        dependencies.push(dependency.as_str());
                    }
                }
                Ok(())
            }
            ConfigEdit::RemoveDependency { path, dependency } => {
                if let Some(table) = find_module_table(modules, path) {
                    if let Some(dependencies) = table
                        .get_mut("depends_on")
                        .and_then(|item| item.as_array_mut())
                    {
                        dependencies.retain(|entry| !dependency_matches(entry, dependency));
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
# project boundaries
source_roots = ["src"]

[[modules]]
path = "domain_one"
depends_on = ["domain_two"]

[[modules]]
path = "domain_two"
depends_on = []
"#;

    fn apply_edits(edits: Vec<ConfigEdit>) -> String {
        let scratch = tempfile::tempdir().unwrap();
        let config_path = scratch.path().join("fence.toml");
        fs::write(&config_path, CONFIG).unwrap();

        let mut editor = ConfigEditor::new();
        for edit in edits {
            editor.enqueue(edit);
        }
        editor.apply(&config_path).unwrap();
        fs::read_to_string(&config_path).unwrap()
    }

    #[test]
    fn add_dependency_preserves_comments() {
        let rewritten = apply_edits(vec![ConfigEdit::AddDependency {
            path: "domain_two".to_string(),
            dependency: "domain_one".to_string(),
            deprecated: false,
        }]);
        assert!(rewritten.contains("# project boundaries"));
        assert!(rewritten.contains(r#"depends_on = ["domain_one"]"#));
    }

    #[test]
    fn add_dependency_is_idempotent() {
        let rewritten = apply_edits(vec![
            ConfigEdit::AddDependency {
                path: "domain_one".to_string(),
                dependency: "domain_two".to_string(),
                deprecated: false,
            },
        ]);
        assert_eq!(rewritten.matches("domain_two").count(), CONFIG.matches("domain_two").count());
    }

    #[test]
    fn remove_dependency_drops_the_entry() {
        let rewritten = apply_edits(vec![ConfigEdit::RemoveDependency {
            path: "domain_one".to_string(),
            dependency: "domain_two".to_string(),
        }]);
        assert!(rewritten.contains("depends_on = []"));
    }

    #[test]
    fn delete_module_removes_the_table() {
        let rewritten = apply_edits(vec![ConfigEdit::DeleteModule {
            path: "domain_two".to_string(),
        }]);
        assert!(!rewritten.contains(r#"path = "domain_two""#));
    }

    #[test]
    fn create_module_appends_a_table() {
        let rewritten = apply_edits(vec![ConfigEdit::CreateModule {
            path: "domain_three".to_string(),
        }]);
        assert!(rewritten.contains(r#"path = "domain_three""#));
    }
}
