pub mod build;
pub mod error;
pub mod tree;
pub mod validation;

pub use build::build_module_tree;
pub use error::ModuleTreeError;
pub use tree::{ModuleNode, ModuleTree};
