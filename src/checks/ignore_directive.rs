use crate::diagnostics::{CodeDiagnostic, Diagnostic, DiagnosticDetails};
use crate::processors::file_module::FileModule;

/// Reports ignore directives which suppressed nothing.
///
/// A directive is considered used when at least one import on its target
/// line was suppressed by it; directives stacked on an already-claimed line
/// are always unused.
#[derive(Debug, Default)]
pub struct IgnoreDirectivePostProcessor;

impl IgnoreDirectivePostProcessor {
    pub fn new() -> Self {
        Self
    }

    pub fn check(&self, file_module: &FileModule) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for directive in file_module.ignore_directives.sorted_directives() {
            let suppressed_anything = file_module
                .directive_ignored_imports
                .iter()
                .any(|import| import.line_no == directive.ignored_line_no);
            if !suppressed_anything {
                diagnostics.push(Diagnostic::new_located_warning(
                    file_module.relative_file_path().to_path_buf(),
                    directive.line_no,
                    DiagnosticDetails::Code(CodeDiagnostic::UnusedIgnoreDirective()),
                ));
            }
        }

        for directive in file_module.ignore_directives.redundant_directives() {
            diagnostics.push(Diagnostic::new_located_warning(
                file_module.relative_file_path().to_path_buf(),
                directive.line_no,
                DiagnosticDetails::Code(CodeDiagnostic::UnusedIgnoreDirective()),
            ));
        }

        diagnostics
    }
}
