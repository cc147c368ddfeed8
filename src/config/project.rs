use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::cache::CacheConfig;
use super::error::ConfigError;
use super::external::ExternalDependencyConfig;
use super::modules::{DependencyConfig, ModuleConfig};
use super::root_module::ROOT_MODULE_SENTINEL_TAG;
use super::utils::*;

/// Legacy tag-based constraint, retained only for migration to the
/// per-module `depends_on` form.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TagConstraint {
    pub tag: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

#[derive(Default, Debug, Clone, PartialEq)]
pub struct UnusedDependencies {
    pub path: String,
    pub dependencies: Vec<DependencyConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
    #[serde(default, skip_serializing_if = "is_empty")]
    pub constraints: Vec<TagConstraint>,
    #[serde(default, skip_serializing_if = "is_empty")]
    pub layers: Vec<String>,
    #[serde(default, skip_serializing_if = "CacheConfig::is_default")]
    pub cache: CacheConfig,
    #[serde(default, skip_serializing_if = "ExternalDependencyConfig::is_default")]
    pub external: ExternalDependencyConfig,
    #[serde(default = "default_excludes")]
    pub exclude: Vec<String>,
    #[serde(default = "default_source_roots")]
    pub source_roots: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub exact: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disable_logging: bool,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub ignore_type_checking_imports: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub include_string_imports: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub forbid_circular_dependencies: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub use_regex_matching: bool,
}

pub fn default_source_roots() -> Vec<PathBuf> {
    vec![PathBuf::from(".")]
}

pub const DEFAULT_EXCLUDE_PATHS: [&str; 4] = ["tests", "docs", ".*__pycache__", ".*egg-info"];

pub fn default_excludes() -> Vec<String> {
    DEFAULT_EXCLUDE_PATHS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            modules: Default::default(),
            constraints: Default::default(),
            layers: Default::default(),
            cache: Default::default(),
            external: Default::default(),
            exclude: default_excludes(),
            source_roots: default_source_roots(),
            exact: Default::default(),
            disable_logging: Default::default(),
            ignore_type_checking_imports: true,
            include_string_imports: Default::default(),
            forbid_circular_dependencies: Default::default(),
            use_regex_matching: Default::default(),
        }
    }
}

impl ProjectConfig {
    pub fn dependencies_for_module(&self, module: &str) -> Option<&Vec<DependencyConfig>> {
        self.modules
            .iter()
            .find(|mod_config| mod_config.path == module)
            .map(|mod_config| &mod_config.depends_on)
    }

    pub fn prepend_roots(&self, project_root: &Path) -> Vec<PathBuf> {
        // don't prepend if root is "."
        self.source_roots
            .iter()
            .map(|root| {
                if root.display().to_string() == "." {
                    project_root.to_path_buf()
                } else {
                    project_root.join(root)
                }
            })
            .collect()
    }

    pub fn module_paths(&self) -> Vec<String> {
        self.modules
            .iter()
            .map(|module| module.path.clone())
            .collect()
    }

    pub fn with_modules(&self, modules: Vec<ModuleConfig>) -> Self {
        Self {
            modules,
            ..self.clone()
        }
    }

    pub fn with_dependencies_removed(&self) -> Self {
        self.with_modules(
            self.modules
                .iter()
                .map(|module| module.with_dependencies_removed())
                .collect(),
        )
    }

    pub fn add_dependency_to_module(&mut self, module: &str, dependency: DependencyConfig) {
        if let Some(module_config) = self
            .modules
            .iter_mut()
            .find(|mod_config| mod_config.path == module)
        {
            if !module_config
                .depends_on
                .iter()
                .any(|dep| dep.path == dependency.path)
            {
                module_config.depends_on.push(dependency);
            }
        } else {
            self.modules.push(ModuleConfig {
                path: module.to_string(),
                depends_on: vec![dependency],
                ..Default::default()
            });
        }
    }

    /// Per-module dependencies declared in `other_config` but not in `self`.
    pub fn compare_dependencies(&self, other_config: &ProjectConfig) -> Vec<UnusedDependencies> {
        let mut all_unused_dependencies = Vec::new();
        let own_module_paths: HashSet<&String> =
            self.modules.iter().map(|module| &module.path).collect();

        for module_config in &other_config.modules {
            if !own_module_paths.contains(&module_config.path) {
                all_unused_dependencies.push(UnusedDependencies {
                    path: module_config.path.clone(),
                    dependencies: module_config.depends_on.clone(),
                });
                continue;
            }

            let own_module_dependency_paths: HashSet<&String> = self
                .dependencies_for_module(&module_config.path)
                .map(|deps| deps.iter().map(|dep| &dep.path).collect())
                .unwrap_or_default();

            let extra_dependencies: Vec<DependencyConfig> = module_config
                .dependencies_iter()
                .filter(|dep| !own_module_dependency_paths.contains(&dep.path))
                .cloned()
                .collect();

            if !extra_dependencies.is_empty() {
                all_unused_dependencies.push(UnusedDependencies {
                    path: module_config.path.clone(),
                    dependencies: extra_dependencies,
                });
            }
        }

        all_unused_dependencies
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen_paths: HashSet<&String> = HashSet::new();
        for module in &self.modules {
            if !seen_paths.insert(&module.path) {
                return Err(ConfigError::DuplicateModulePath(module.path.clone()));
            }

            if module
                .dependencies_iter()
                .any(|dep| dep.path == module.path)
            {
                return Err(ConfigError::SelfDependency(module.path.clone()));
            }

            if !module.is_root() && module.tags.iter().any(|tag| tag == ROOT_MODULE_SENTINEL_TAG) {
                return Err(ConfigError::ReservedRootTag {
                    module: module.path.clone(),
                    tag: ROOT_MODULE_SENTINEL_TAG.to_string(),
                });
            }

            if let Some(layer) = &module.layer {
                if !self.layers.contains(layer) {
                    return Err(ConfigError::UnknownLayer {
                        module: module.path.clone(),
                        layer: layer.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
