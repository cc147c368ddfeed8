pub mod cache;
pub mod edit;
pub mod error;
pub mod external;
pub mod modules;
pub mod project;
pub mod root_module;
pub mod utils;

pub use cache::{CacheBackend, CacheConfig};
pub use edit::{ConfigEdit, ConfigEditor, EditError};
pub use error::ConfigError;
pub use external::ExternalDependencyConfig;
pub use modules::{DependencyConfig, ModuleConfig};
pub use project::{ProjectConfig, TagConstraint, UnusedDependencies};
pub use root_module::ROOT_MODULE_SENTINEL_TAG;
