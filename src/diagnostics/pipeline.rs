use super::diagnostics::Diagnostic;
use super::error::DiagnosticError;

pub type Result<T> = std::result::Result<T, DiagnosticError>;

// Turn input files into IR (imports, directives, module handles)
pub trait FileProcessor<'a, P> {
    type ProcessedFile;

    fn process(&'a self, file_path: P) -> Result<Self::ProcessedFile>;
}

// Turn IR into diagnostics
pub trait FileChecker<'a> {
    type ProcessedFile;
    type Output: IntoIterator<Item = Diagnostic>;

    fn check(&'a self, processed_file: &Self::ProcessedFile) -> Result<Self::Output>;
}

// If a type can process a file into IR and check that IR, it can turn the
// file directly into diagnostics.
pub trait DiagnosticPipeline<'a, P> {
    type Output: IntoIterator<Item = Diagnostic>;

    fn diagnostics(&'a self, input: P) -> Result<Self::Output>;
}

impl<'a, P, T> DiagnosticPipeline<'a, P> for T
where
    T: FileProcessor<'a, P>
        + FileChecker<'a, ProcessedFile = <T as FileProcessor<'a, P>>::ProcessedFile>,
{
    type Output = <T as FileChecker<'a>>::Output;

    fn diagnostics(&'a self, input: P) -> Result<Self::Output> {
        let processed_file = self.process(input)?;
        let diagnostics = self.check(&processed_file)?;
        Ok(diagnostics)
    }
}
