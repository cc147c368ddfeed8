pub mod check;
pub mod check_external;
pub mod report;
pub mod show;
pub mod sync;

pub use check::{check, CheckError};
pub use check_external::{check_external_dependencies, ExternalCheckError};
pub use report::{create_dependency_report, ReportCreationError};
pub use show::{generate_module_graph_dot, generate_module_graph_mermaid};
pub use sync::{detect_unused_dependencies, sync_dependency_constraints, sync_project, SyncError};
pub use test::{get_affected_modules, AffectedTestsHandler, TestError};
