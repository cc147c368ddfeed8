pub mod diagnostics;
pub mod error;
pub mod pipeline;
pub mod sarif;

pub use diagnostics::{
    serialize_diagnostics_json, sort_diagnostics, CodeDiagnostic, ConfigurationDiagnostic,
    Diagnostic, DiagnosticDetails, Severity,
};
pub use error::DiagnosticError;
pub use pipeline::{DiagnosticPipeline, FileChecker, FileProcessor, Result};
pub use sarif::render_sarif;
