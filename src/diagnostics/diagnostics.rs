use std::fmt::Display;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Copy, Clone, Eq, PartialOrd, Ord, Serialize, PartialEq)]
pub enum Severity {
    Error,
    Warning,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "Error"),
            Severity::Warning => write!(f, "Warning"),
        }
    }
}

#[derive(Error, Debug, Clone, Serialize, PartialEq)]
pub enum ConfigurationDiagnostic {
    #[error("Module containing '{file_mod_path}' not found in project.")]
    ModuleNotFound { file_mod_path: String },

    #[error("Module '{module_path}' not found on disk. It will be ignored.")]
    ModuleNotOnDisk { module_path: String },

    #[error("Could not find module configuration for module '{module_path}'.")]
    ModuleConfigNotFound { module_path: String },

    #[error("Layer '{layer}' is not defined in the project.")]
    UnknownLayer { layer: String },

    #[error("No first-party imports were found. You may need to update your source roots.")]
    NoFirstPartyImportsFound(),

    #[error("Skipped '{file_path}' due to a syntax error.")]
    SkippedFileSyntaxError { file_path: String },

    #[error("Skipped '{file_path}' due to an I/O error.")]
    SkippedFileIoError { file_path: String },
}

#[derive(Error, Debug, Clone, Serialize, PartialEq)]
pub enum CodeDiagnostic {
    #[error("Cannot import '{dependency}'. Module '{usage_module}' cannot depend on '{definition_module}'.")]
    UndeclaredDependency {
        dependency: String,
        usage_module: String,
        definition_module: String,
        allowed: Vec<String>,
    },

    #[error("Import '{dependency}' is deprecated. Module '{usage_module}' should not depend on '{definition_module}'.")]
    DeprecatedDependency {
        dependency: String,
        usage_module: String,
        definition_module: String,
    },

    #[error("Module '{definition_module}' is in strict mode. Only imports from its public interface are allowed. The import '{dependency}' (in module '{usage_module}') is not included in its interface members.")]
    PrivateDependency {
        dependency: String,
        usage_module: String,
        definition_module: String,
    },

    #[error("Module '{definition_module}' is not visible from '{usage_module}'. Visibility patterns: {visibility:?}.")]
    InvisibleDependency {
        dependency: String,
        usage_module: String,
        definition_module: String,
        visibility: Vec<String>,
    },

    #[error("Cannot import '{dependency}'. Layer '{usage_layer}' ('{usage_module}') is lower than layer '{definition_layer}' ('{definition_module}').")]
    LayerViolation {
        dependency: String,
        usage_module: String,
        usage_layer: String,
        definition_module: String,
        definition_layer: String,
    },

    #[error("Ignore directive is unused.")]
    UnusedIgnoreDirective(),

    #[error("Import '{dependency}' is not declared as a dependency in '{package_name}'.")]
    UndeclaredExternalDependency {
        dependency: String,
        package_name: String,
    },

    #[error("External package '{package_module_name}' is declared in '{package_name}' but never imported.")]
    UnusedExternalDependency {
        package_module_name: String,
        package_name: String,
    },
}

impl CodeDiagnostic {
    pub fn dependency(&self) -> Option<&str> {
        match self {
            CodeDiagnostic::UndeclaredDependency { dependency, .. }
            | CodeDiagnostic::DeprecatedDependency { dependency, .. }
            | CodeDiagnostic::PrivateDependency { dependency, .. }
            | CodeDiagnostic::InvisibleDependency { dependency, .. }
            | CodeDiagnostic::LayerViolation { dependency, .. }
            | CodeDiagnostic::UndeclaredExternalDependency { dependency, .. } => Some(dependency),
            CodeDiagnostic::UnusedExternalDependency {
                package_module_name,
                ..
            } => Some(package_module_name),
            CodeDiagnostic::UnusedIgnoreDirective() => None,
        }
    }

    pub fn usage_module(&self) -> Option<&str> {
        match self {
            CodeDiagnostic::UndeclaredDependency { usage_module, .. }
            | CodeDiagnostic::DeprecatedDependency { usage_module, .. }
            | CodeDiagnostic::PrivateDependency { usage_module, .. }
            | CodeDiagnostic::InvisibleDependency { usage_module, .. }
            | CodeDiagnostic::LayerViolation { usage_module, .. } => Some(usage_module),
            _ => None,
        }
    }

    pub fn definition_module(&self) -> Option<&str> {
        match self {
            CodeDiagnostic::UndeclaredDependency {
                definition_module, ..
            }
            | CodeDiagnostic::DeprecatedDependency {
                definition_module, ..
            }
            | CodeDiagnostic::PrivateDependency {
                definition_module, ..
            }
            | CodeDiagnostic::InvisibleDependency {
                definition_module, ..
            }
            | CodeDiagnostic::LayerViolation {
                definition_module, ..
            } => Some(definition_module),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum DiagnosticDetails {
    Code(CodeDiagnostic),
    Configuration(ConfigurationDiagnostic),
}

impl Display for DiagnosticDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticDetails::Code(code) => write!(f, "{}", code),
            DiagnosticDetails::Configuration(config) => write!(f, "{}", config),
        }
    }
}

impl DiagnosticDetails {
    /// Stable rank used for deterministic ordering of the final report.
    fn kind_rank(&self) -> u8 {
        match self {
            DiagnosticDetails::Code(code) => match code {
                CodeDiagnostic::UndeclaredDependency { .. } => 0,
                CodeDiagnostic::DeprecatedDependency { .. } => 1,
                CodeDiagnostic::PrivateDependency { .. } => 2,
                CodeDiagnostic::InvisibleDependency { .. } => 3,
                CodeDiagnostic::LayerViolation { .. } => 4,
                CodeDiagnostic::UnusedIgnoreDirective() => 5,
                CodeDiagnostic::UndeclaredExternalDependency { .. } => 6,
                CodeDiagnostic::UnusedExternalDependency { .. } => 7,
            },
            DiagnosticDetails::Configuration(config) => match config {
                ConfigurationDiagnostic::ModuleNotFound { .. } => 8,
                ConfigurationDiagnostic::ModuleNotOnDisk { .. } => 9,
                ConfigurationDiagnostic::ModuleConfigNotFound { .. } => 10,
                ConfigurationDiagnostic::UnknownLayer { .. } => 11,
                ConfigurationDiagnostic::NoFirstPartyImportsFound() => 12,
                ConfigurationDiagnostic::SkippedFileSyntaxError { .. } => 13,
                ConfigurationDiagnostic::SkippedFileIoError { .. } => 14,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum Diagnostic {
    Global {
        severity: Severity,
        details: DiagnosticDetails,
    },
    Located {
        file_path: PathBuf,
        line_number: usize,
        severity: Severity,
        details: DiagnosticDetails,
    },
}

impl Diagnostic {
    pub fn new_global(severity: Severity, details: DiagnosticDetails) -> Self {
        Self::Global { severity, details }
    }

    pub fn new_located(
        severity: Severity,
        details: DiagnosticDetails,
        file_path: PathBuf,
        line_number: usize,
    ) -> Self {
        Self::Located {
            severity,
            details,
            file_path,
            line_number,
        }
    }

    pub fn new_located_error(
        file_path: PathBuf,
        line_number: usize,
        details: DiagnosticDetails,
    ) -> Self {
        Self::Located {
            file_path,
            line_number,
            severity: Severity::Error,
            details,
        }
    }

    pub fn new_located_warning(
        file_path: PathBuf,
        line_number: usize,
        details: DiagnosticDetails,
    ) -> Self {
        Self::Located {
            file_path,
            line_number,
            severity: Severity::Warning,
            details,
        }
    }

    pub fn new_global_error(details: DiagnosticDetails) -> Self {
        Self::Global {
            severity: Severity::Error,
            details,
        }
    }

    pub fn new_global_warning(details: DiagnosticDetails) -> Self {
        Self::Global {
            severity: Severity::Warning,
            details,
        }
    }

    pub fn details(&self) -> &DiagnosticDetails {
        match self {
            Self::Global { details, .. } => details,
            Self::Located { details, .. } => details,
        }
    }

    pub fn message(&self) -> String {
        self.details().to_string()
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::Global { severity, .. } => *severity,
            Self::Located { severity, .. } => *severity,
        }
    }

    pub fn file_path(&self) -> Option<&PathBuf> {
        match self {
            Self::Global { .. } => None,
            Self::Located { file_path, .. } => Some(file_path),
        }
    }

    pub fn line_number(&self) -> Option<usize> {
        match self {
            Self::Global { .. } => None,
            Self::Located { line_number, .. } => Some(*line_number),
        }
    }

    pub fn is_code(&self) -> bool {
        matches!(self.details(), DiagnosticDetails::Code { .. })
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self.details(), DiagnosticDetails::Configuration { .. })
    }

    pub fn is_dependency_error(&self) -> bool {
        matches!(
            self.details(),
            DiagnosticDetails::Code(CodeDiagnostic::UndeclaredDependency { .. })
                | DiagnosticDetails::Code(CodeDiagnostic::DeprecatedDependency { .. })
                | DiagnosticDetails::Code(CodeDiagnostic::LayerViolation { .. })
        )
    }

    pub fn is_interface_error(&self) -> bool {
        matches!(
            self.details(),
            DiagnosticDetails::Code(CodeDiagnostic::PrivateDependency { .. })
                | DiagnosticDetails::Code(CodeDiagnostic::InvisibleDependency { .. })
        )
    }

    pub fn is_deprecated(&self) -> bool {
        matches!(
            self.details(),
            DiagnosticDetails::Code(CodeDiagnostic::DeprecatedDependency { .. })
        )
    }

    pub fn is_error(&self) -> bool {
        matches!(self.severity(), Severity::Error)
    }

    pub fn is_warning(&self) -> bool {
        matches!(self.severity(), Severity::Warning)
    }

    pub fn dependency(&self) -> Option<&str> {
        match self.details() {
            DiagnosticDetails::Code(details) => details.dependency(),
            _ => None,
        }
    }

    pub fn usage_module(&self) -> Option<&str> {
        match self.details() {
            DiagnosticDetails::Code(details) => details.usage_module(),
            _ => None,
        }
    }

    pub fn definition_module(&self) -> Option<&str> {
        match self.details() {
            DiagnosticDetails::Code(details) => details.definition_module(),
            _ => None,
        }
    }
}

/// Deterministic report order: `(file_path, line_number, kind)`, with global
/// diagnostics ahead of located ones. The result is independent of worker
/// scheduling.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        (
            a.file_path(),
            a.line_number(),
            a.details().kind_rank(),
            a.message(),
        )
            .cmp(&(
                b.file_path(),
                b.line_number(),
                b.details().kind_rank(),
                b.message(),
            ))
    });
}

pub fn serialize_diagnostics_json(diagnostics: &[Diagnostic], pretty_print: bool) -> String {
    if pretty_print {
        serde_json::to_string_pretty(&diagnostics).unwrap()
    } else {
        serde_json::to_string(&diagnostics).unwrap()
    }
}
