use std::collections::HashMap;
use std::path::Path;

use crate::config::{DependencyConfig, ProjectConfig};
use crate::filesystem;

use super::error::Result;

pub const CONFIG_FILE_NAME: &str = "fence.toml";

/// Expand legacy tag-based constraints onto the modules carrying each tag.
///
/// Returns true when the config was changed, so callers know to rewrite the
/// file in the per-module form.
fn migrate_tag_constraints(config: &mut ProjectConfig) -> bool {
    if config.constraints.is_empty() {
        return false;
    }

    let mut paths_by_tag: HashMap<String, Vec<String>> = HashMap::new();
    for module in &config.modules {
        for tag in &module.tags {
            paths_by_tag
                .entry(tag.clone())
                .or_default()
                .push(module.path.clone());
        }
    }

    let constraints = std::mem::take(&mut config.constraints);
    for constraint in &constraints {
        let dependency_paths: Vec<String> = constraint
            .depends_on
            .iter()
            .filter_map(|tag| paths_by_tag.get(tag.as_str()))
            .flatten()
            .cloned()
            .collect();

        let Some(source_paths) = paths_by_tag.get(constraint.tag.as_str()) else {
            continue;
        };
        for source_path in source_paths.clone() {
            for dependency_path in &dependency_paths {
                if *dependency_path == source_path {
                    continue;
                }
                config.add_dependency_to_module(
                    &source_path,
                    DependencyConfig::from_path(dependency_path),
                );
            }
        }
    }

    true
}

/// Parse the project config, migrating legacy forms in memory.
///
/// The second return value tells the caller whether the parsed document was
/// rewritten during migration and should be saved back in the new form.
pub fn parse_project_config<P: AsRef<Path>>(filepath: P) -> Result<(ProjectConfig, bool)> {
    let content = filesystem::read_file_content(filepath)?;
    let mut config: ProjectConfig = toml::from_str(&content)?;
    let migrated = migrate_tag_constraints(&mut config);
    Ok((config, migrated))
}

pub fn dump_project_config_to_toml(config: &ProjectConfig) -> Result<String> {
    Ok(toml::to_string(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModuleConfig;

    #[test]
    fn parses_a_minimal_config() {
        let scratch = tempfile::tempdir().unwrap();
        let config_path = scratch.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &config_path,
            r#"
source_roots = ["src"]
forbid_circular_dependencies = true

[[modules]]
path = "domain_one"
depends_on = ["domain_two"]

[[modules]]
path = "domain_two"
"#,
        )
        .unwrap();

        let (config, migrated) = parse_project_config(&config_path).unwrap();
        assert!(!migrated);
        assert!(config.forbid_circular_dependencies);
        assert_eq!(config.source_roots, vec![std::path::PathBuf::from("src")]);
        assert_eq!(
            config.dependencies_for_module("domain_one"),
            Some(&vec![DependencyConfig::from_path("domain_two")])
        );
        assert!(config.ignore_type_checking_imports);
    }

    #[test]
    fn migrates_legacy_tag_constraints() {
        let scratch = tempfile::tempdir().unwrap();
        let config_path = scratch.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &config_path,
            r#"
[[modules]]
path = "app"
tags = ["ui"]

[[modules]]
path = "core"
tags = ["lib"]

[[constraints]]
tag = "ui"
depends_on = ["lib"]
"#,
        )
        .unwrap();

        let (config, migrated) = parse_project_config(&config_path).unwrap();
        assert!(migrated);
        assert!(config.constraints.is_empty());
        assert_eq!(
            config.dependencies_for_module("app"),
            Some(&vec![DependencyConfig::from_path("core")])
        );
        assert_eq!(config.dependencies_for_module("core"), Some(&vec![]));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = ProjectConfig {
            modules: vec![
                ModuleConfig {
                    path: "domain_one".to_string(),
                    depends_on: vec![DependencyConfig::from_deprecated_path("domain_two")],
                    strict: true,
                    ..Default::default()
                },
                ModuleConfig::new("domain_two", false),
            ],
            ..Default::default()
        };

        let dumped = dump_project_config_to_toml(&config).unwrap();
        let reparsed: ProjectConfig = toml::from_str(&dumped).unwrap();
        assert_eq!(reparsed, config);
    }
}
