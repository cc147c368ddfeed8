pub mod ignore_directive;
pub mod import;

pub use ignore_directive::IgnoreDirectivePostProcessor;
pub use import::ImportChecker;
