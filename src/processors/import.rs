use std::path::{Path, PathBuf};

use ruff_python_ast::statement_visitor::{walk_stmt, StatementVisitor};
use ruff_python_ast::visitor::Visitor;
use ruff_python_ast::{Expr, Mod, Stmt, StmtIf, StmtImport, StmtImportFrom};
use ruff_source_file::LineIndex;
use thiserror::Error;

use crate::filesystem::{self, PACKAGE_FILE_NAME, PYTHON_EXTENSION};
use crate::python::error::ParsingError;
use crate::python::parsing::parse_python_source;

use super::ignore_directive::{get_ignore_directives, IgnoreDirective, IgnoreDirectives};

#[derive(Error, Debug)]
pub enum ImportParseError {
    #[error("Failed to parse project imports.\nFile: {file}\nFailure: {source}")]
    Parsing {
        file: String,
        #[source]
        source: ParsingError,
    },
    #[error("Failed to parse project imports.\n{0}")]
    Filesystem(#[from] filesystem::FileSystemError),
}

pub type Result<T> = std::result::Result<T, ImportParseError>;

/// An import with a fully-resolved module path and located line number.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedImport {
    pub module_path: String,
    pub line_no: usize,
}

impl NormalizedImport {
    pub fn top_level_module_name(&self) -> &str {
        self.module_path
            .split('.')
            .next()
            .expect("Normalized import module path is empty")
    }
}

#[derive(Debug, Default)]
pub struct NormalizedImports {
    pub imports: Vec<NormalizedImport>,
    pub directive_ignored_imports: Vec<NormalizedImport>,
}

impl NormalizedImports {
    fn extend_imports(&mut self, other: NormalizedImports) {
        self.imports.extend(other.imports);
        self.directive_ignored_imports
            .extend(other.directive_ignored_imports);
    }
}

fn directive_ignores_path(directive: Option<&IgnoreDirective>, module_path: &str) -> bool {
    // Named directives suppress fully-qualified paths only
    directive.is_some_and(|directive| {
        directive.modules.is_empty()
            || directive
                .modules
                .iter()
                .any(|module| module == module_path)
    })
}

pub struct ImportVisitor<'a> {
    file_mod_path: Option<String>,
    line_index: &'a LineIndex,
    is_package: bool,
    ignore_directives: &'a IgnoreDirectives,
    ignore_type_checking_imports: bool,
    pub normalized_imports: NormalizedImports,
}

impl<'a> ImportVisitor<'a> {
    pub fn new(
        file_mod_path: Option<String>,
        line_index: &'a LineIndex,
        is_package: bool,
        ignore_directives: &'a IgnoreDirectives,
        ignore_type_checking_imports: bool,
    ) -> Self {
        ImportVisitor {
            file_mod_path,
            line_index,
            is_package,
            ignore_directives,
            ignore_type_checking_imports,
            normalized_imports: Default::default(),
        }
    }

    fn line_number(&self, offset: ruff_text_size::TextSize) -> usize {
        self.line_index.line_index(offset).get()
    }

    fn normalize_absolute_import(&self, import_statement: &StmtImport) -> NormalizedImports {
        let mut normalized_imports = NormalizedImports::default();
        let line_no = self.line_number(import_statement.range.start());
        let directive = self.ignore_directives.get(&line_no);

        for alias in &import_statement.names {
            if directive_ignores_path(directive, alias.name.as_str()) {
                // Ignored imports carry the statement line, for directive accounting
                normalized_imports
                    .directive_ignored_imports
                    .push(NormalizedImport {
                        module_path: alias.name.to_string(),
                        line_no,
                    });
            } else {
                normalized_imports.imports.push(NormalizedImport {
                    module_path: alias.name.to_string(),
                    line_no: self.line_number(alias.range.start()),
                });
            }
        }
        normalized_imports
    }

    fn normalize_import_from(&self, import_statement: &StmtImportFrom) -> NormalizedImports {
        let mut normalized_imports = NormalizedImports::default();

        let import_depth: usize = import_statement.level.try_into().unwrap();
        let num_paths_to_strip = if self.is_package {
            import_depth.saturating_sub(1)
        } else {
            import_depth
        };

        let mod_path = match &self.file_mod_path {
            Some(mod_path) => mod_path,
            None => "",
        };
        // If our current file mod path is None, we are not within the source root
        // so we assume that relative imports are also not within the source root
        if mod_path.is_empty() && import_depth > 0 {
            return normalized_imports;
        };

        let base_path_parts: Vec<&str> = mod_path.split('.').collect();
        let base_path_parts = if num_paths_to_strip > 0 {
            base_path_parts[..base_path_parts.len() - num_paths_to_strip].to_vec()
        } else {
            base_path_parts
        };

        let base_mod_path = if let Some(ref module) = import_statement.module {
            if import_depth > 0 {
                // For relative imports (level > 0), the base module path is
                // the current file's mod path minus the stripped segments,
                // plus the module we are importing from
                if base_path_parts.is_empty() {
                    module.to_string()
                } else {
                    format!("{}.{}", base_path_parts.join("."), module)
                }
            } else {
                module.to_string()
            }
        } else {
            // Importing from the current package ('.') or a parent ('..' or
            // more); the remaining parts of the file's mod path are the base
            if base_path_parts.is_empty() {
                // A current-package import outside of a source root
                return normalized_imports;
            }
            base_path_parts.join(".")
        };

        let line_no = self.line_number(import_statement.range.start());
        let directive = self.ignore_directives.get(&line_no);

        for name in &import_statement.names {
            let global_mod_path = format!("{}.{}", base_mod_path, name.name.as_str());

            if directive_ignores_path(directive, &global_mod_path) {
                normalized_imports
                    .directive_ignored_imports
                    .push(NormalizedImport {
                        module_path: global_mod_path,
                        line_no,
                    });
            } else {
                normalized_imports.imports.push(NormalizedImport {
                    module_path: global_mod_path,
                    line_no: self.line_number(name.range.start()),
                });
            }
        }

        normalized_imports
    }

    fn should_ignore_if_statement(&mut self, node: &StmtIf) -> bool {
        let id = match node.test.as_ref() {
            Expr::Name(ref name) => Some(name.id.as_str()),
            // This will match a single-level attribute access in cases like:
            // import typing as t; if t.TYPE_CHECKING: ...
            Expr::Attribute(ref attribute) => Some(attribute.attr.as_str()),
            _ => None,
        };
        id.unwrap_or_default() == "TYPE_CHECKING" && self.ignore_type_checking_imports
    }

    fn visit_stmt_import(&mut self, node: &StmtImport) {
        let stmt_imports = self.normalize_absolute_import(node);
        self.normalized_imports.extend_imports(stmt_imports);
    }

    fn visit_stmt_import_from(&mut self, node: &StmtImportFrom) {
        let stmt_imports = self.normalize_import_from(node);
        self.normalized_imports.extend_imports(stmt_imports);
    }
}

impl<'a> StatementVisitor<'a> for ImportVisitor<'_> {
    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        match stmt {
            Stmt::Import(statement) => self.visit_stmt_import(statement),
            Stmt::ImportFrom(statement) => self.visit_stmt_import_from(statement),
            Stmt::If(statement) => {
                if !self.should_ignore_if_statement(statement) {
                    walk_stmt(self, stmt)
                }
            }
            _ => walk_stmt(self, stmt),
        }
    }
}

struct StringImportVisitor<'a> {
    source_roots: &'a [PathBuf],
    line_index: &'a LineIndex,
    pub normalized_imports: Vec<NormalizedImport>,
}

impl<'a> StringImportVisitor<'a> {
    fn new(source_roots: &'a [PathBuf], line_index: &'a LineIndex) -> Self {
        StringImportVisitor {
            source_roots,
            line_index,
            normalized_imports: vec![],
        }
    }
}

impl Visitor<'_> for StringImportVisitor<'_> {
    fn visit_string_literal(&mut self, string_literal: &ruff_python_ast::StringLiteral) {
        // Dotted-identifier heuristic: require at least two separators
        if string_literal.value.chars().filter(|&c| c == '.').count() < 2 {
            return;
        }

        let resolved_module =
            filesystem::module_to_file_path(self.source_roots, &string_literal.value, true);
        if resolved_module.is_some() {
            self.normalized_imports.push(NormalizedImport {
                module_path: string_literal.value.to_string(),
                line_no: self
                    .line_index
                    .line_index(string_literal.range.start())
                    .get(),
            });
        }
    }
}

/// First-party iff the top segment is a directory or source file under some
/// source root. Source roots are assumed to be absolute paths.
pub fn is_project_import<P: AsRef<Path>>(source_roots: &[P], mod_path: &str) -> bool {
    let module_base = match mod_path.split('.').next() {
        Some(base) if !base.is_empty() => base,
        _ => return false,
    };

    source_roots.iter().any(|root| {
        let base_path = root.as_ref().join(module_base);
        base_path.is_dir()
            || base_path
                .with_extension(PYTHON_EXTENSION)
                .is_file()
    })
}

pub fn get_normalized_imports_from_ast(
    source_roots: &[PathBuf],
    file_path: &Path,
    file_ast: &Mod,
    line_index: &LineIndex,
    ignore_directives: &IgnoreDirectives,
    ignore_type_checking_imports: bool,
    include_string_imports: bool,
) -> NormalizedImports {
    let is_package = file_path.ends_with(PACKAGE_FILE_NAME);
    let file_mod_path: Option<String> =
        filesystem::file_to_module_path(source_roots, file_path).ok();
    let mut import_visitor = ImportVisitor::new(
        file_mod_path,
        line_index,
        is_package,
        ignore_directives,
        ignore_type_checking_imports,
    );
    let mut string_import_visitor = StringImportVisitor::new(source_roots, line_index);

    match file_ast {
        Mod::Module(ref module) => {
            import_visitor.visit_body(&module.body);
            if include_string_imports {
                string_import_visitor.visit_body(&module.body);
            }
        }
        Mod::Expression(_) => (),
    };

    let mut normalized_imports = import_visitor.normalized_imports;
    if include_string_imports {
        normalized_imports
            .imports
            .extend(string_import_visitor.normalized_imports);
    }
    normalized_imports
}

pub fn get_normalized_imports(
    source_roots: &[PathBuf],
    file_path: &Path,
    file_contents: &str,
    ignore_type_checking_imports: bool,
    include_string_imports: bool,
) -> Result<NormalizedImports> {
    let file_ast = parse_python_source(file_contents).map_err(|err| ImportParseError::Parsing {
        file: file_path.display().to_string(),
        source: err,
    })?;
    let line_index = LineIndex::from_source_text(file_contents);
    let ignore_directives = get_ignore_directives(file_contents);
    Ok(get_normalized_imports_from_ast(
        source_roots,
        file_path,
        &file_ast,
        &line_index,
        &ignore_directives,
        ignore_type_checking_imports,
        include_string_imports,
    ))
}

#[derive(Debug, Default)]
pub struct ProjectImports {
    pub imports: Vec<NormalizedImport>,
    pub directive_ignored_imports: Vec<NormalizedImport>,
}

/// Extract first-party imports from the file at `file_path`.
pub fn get_project_imports(
    source_roots: &[PathBuf],
    file_path: &Path,
    ignore_type_checking_imports: bool,
    include_string_imports: bool,
) -> Result<ProjectImports> {
    let file_contents = filesystem::read_file_content(file_path)?;
    let normalized_imports = get_normalized_imports(
        source_roots,
        file_path,
        &file_contents,
        ignore_type_checking_imports,
        include_string_imports,
    )?;
    Ok(ProjectImports {
        imports: normalized_imports
            .imports
            .into_iter()
            .filter(|import| is_project_import(source_roots, &import.module_path))
            .collect(),
        directive_ignored_imports: normalized_imports
            .directive_ignored_imports
            .into_iter()
            .filter(|import| is_project_import(source_roots, &import.module_path))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn imports_from(file_path: &str, source: &str) -> NormalizedImports {
        get_normalized_imports(
            &[PathBuf::from("src")],
            Path::new(file_path),
            source,
            true,
            false,
        )
        .unwrap()
    }

    fn paths(imports: &[NormalizedImport]) -> Vec<&str> {
        imports
            .iter()
            .map(|import| import.module_path.as_str())
            .collect()
    }

    #[test]
    fn absolute_imports_produce_their_names() {
        let imports = imports_from("src/app.py", "import os\nimport a.b, c\n");
        assert_eq!(paths(&imports.imports), vec!["os", "a.b", "c"]);
        assert_eq!(imports.imports[1].line_no, 2);
    }

    #[test]
    fn from_imports_expand_aliases() {
        let imports = imports_from("src/app.py", "from a.b import x, y as z\n");
        assert_eq!(paths(&imports.imports), vec!["a.b.x", "a.b.y"]);
    }

    #[rstest]
    // from .x import y in a non-package file resolves against the parent
    #[case("src/pkg/mod.py", "from .sibling import y\n", "pkg.sibling.y")]
    // from ..other import z in a package initializer strips level-1 segments
    #[case("src/a/b/__init__.py", "from ..other import z\n", "a.other.z")]
    #[case("src/a/b/__init__.py", "from . import util\n", "a.b.util")]
    #[case("src/pkg/mod.py", "from . import util\n", "pkg.util")]
    fn relative_imports_resolve_against_the_file(
        #[case] file_path: &str,
        #[case] source: &str,
        #[case] expected: &str,
    ) {
        let imports = imports_from(file_path, source);
        assert_eq!(paths(&imports.imports), vec![expected]);
    }

    #[test]
    fn import_order_is_preserved() {
        let imports = imports_from(
            "src/app.py",
            "import b\nfrom a import x\nimport b\nimport a.c\n",
        );
        assert_eq!(paths(&imports.imports), vec!["b", "a.x", "b", "a.c"]);
        let lines: Vec<usize> = imports.imports.iter().map(|i| i.line_no).collect();
        assert_eq!(lines, vec![1, 2, 3, 4]);
    }

    #[rstest]
    #[case(true, vec!["os"])]
    #[case(false, vec!["os", "expensive.types"])]
    fn type_checking_blocks_are_gated_by_the_flag(
        #[case] ignore_type_checking: bool,
        #[case] expected: Vec<&str>,
    ) {
        let source = "import os\nif TYPE_CHECKING:\n    import expensive.types\n";
        let imports = get_normalized_imports(
            &[PathBuf::from("src")],
            Path::new("src/app.py"),
            source,
            ignore_type_checking,
            false,
        )
        .unwrap();
        assert_eq!(paths(&imports.imports), expected);
    }

    #[test]
    fn attribute_type_checking_blocks_are_recognized() {
        let source = "import typing as t\nif t.TYPE_CHECKING:\n    import hidden\n";
        let imports = imports_from("src/app.py", source);
        assert_eq!(paths(&imports.imports), vec!["typing"]);
    }

    #[test]
    fn conditional_blocks_are_traversed() {
        let source = "if DEBUG:\n    import debug_tools\nelse:\n    import prod_tools\n";
        let imports = imports_from("src/app.py", source);
        assert_eq!(paths(&imports.imports), vec!["debug_tools", "prod_tools"]);
    }

    #[test]
    fn blanket_directive_suppresses_the_whole_statement() {
        let source = "# fence-ignore\nfrom b import c\nfrom b import d\n";
        let imports = imports_from("src/app.py", source);
        assert_eq!(paths(&imports.imports), vec!["b.d"]);
        assert_eq!(paths(&imports.directive_ignored_imports), vec!["b.c"]);
    }

    #[test]
    fn named_directive_suppresses_only_listed_paths() {
        let source = "# fence-ignore b.c\nfrom b import c, d\n";
        let imports = imports_from("src/app.py", source);
        assert_eq!(paths(&imports.imports), vec!["b.d"]);
        assert_eq!(paths(&imports.directive_ignored_imports), vec!["b.c"]);
    }

    #[test]
    fn trailing_directive_applies_to_its_own_line() {
        let source = "from b import c  # fence-ignore\nfrom b import d\n";
        let imports = imports_from("src/app.py", source);
        assert_eq!(paths(&imports.imports), vec!["b.d"]);
    }

    #[test]
    fn string_imports_resolve_against_the_source_tree() {
        let scratch = tempfile::tempdir().unwrap();
        let root = scratch.path();
        std::fs::create_dir_all(root.join("src/pkg/sub")).unwrap();
        std::fs::write(root.join("src/pkg/__init__.py"), "").unwrap();
        std::fs::write(root.join("src/pkg/sub/__init__.py"), "").unwrap();
        std::fs::write(root.join("src/pkg/sub/target.py"), "").unwrap();

        let source = "DOTTED = \"pkg.sub.target\"\nOTHER = \"not.a.module\"\n";
        let imports = get_normalized_imports(
            &[root.join("src")],
            &root.join("src/app.py"),
            source,
            true,
            true,
        )
        .unwrap();
        assert_eq!(paths(&imports.imports), vec!["pkg.sub.target"]);
        assert_eq!(imports.imports[0].line_no, 1);
    }

    #[test]
    fn syntax_errors_surface_as_parsing_failures() {
        let result = get_normalized_imports(
            &[PathBuf::from("src")],
            Path::new("src/app.py"),
            "def broken(:\n",
            true,
            false,
        );
        assert!(matches!(result, Err(ImportParseError::Parsing { .. })));
    }
}
