pub mod file_module;
pub mod ignore_directive;
pub mod import;
pub mod interface_members;
pub mod internal_dependency;

pub use file_module::FileModule;
pub use ignore_directive::{get_ignore_directives, IgnoreDirective, IgnoreDirectives};
pub use import::{
    get_normalized_imports, get_project_imports, ImportParseError, NormalizedImport,
    NormalizedImports,
};
pub use internal_dependency::InternalDependencyExtractor;
