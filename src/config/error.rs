use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file does not exist")]
    ConfigDoesNotExist,
    #[error("Module '{0}' is defined more than once.")]
    DuplicateModulePath(String),
    #[error("Module '{0}' cannot depend on itself.")]
    SelfDependency(String),
    #[error("The tag '{tag}' is reserved for the root module, but module '{module}' uses it.")]
    ReservedRootTag { module: String, tag: String },
    #[error("Layer '{layer}' (in module '{module}') is not declared in the project layers.")]
    UnknownLayer { module: String, layer: String },
}
