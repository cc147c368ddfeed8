#[cfg(test)]
pub mod fixtures {
    use rstest::fixture;

    use crate::config::{
        DependencyConfig, ModuleConfig, ProjectConfig, ROOT_MODULE_SENTINEL_TAG,
    };
    use crate::modules::ModuleTree;

    pub fn fixture_modules() -> Vec<ModuleConfig> {
        vec![
            ModuleConfig {
                path: "domain_one".to_string(),
                strict: true,
                depends_on: vec![
                    DependencyConfig::from_deprecated_path("domain_one.subdomain"),
                    DependencyConfig::from_path("domain_three"),
                    DependencyConfig::from_path(ROOT_MODULE_SENTINEL_TAG),
                ],
                ..Default::default()
            },
            ModuleConfig {
                path: "domain_one.subdomain".to_string(),
                visibility: vec!["domain_one".to_string()],
                ..Default::default()
            },
            ModuleConfig {
                path: "domain_two".to_string(),
                depends_on: vec![DependencyConfig::from_path("domain_one")],
                ..Default::default()
            },
            ModuleConfig {
                path: "domain_two.subdomain".to_string(),
                depends_on: vec![DependencyConfig::from_path("domain_one")],
                ..Default::default()
            },
            ModuleConfig::new("domain_three", false),
            ModuleConfig {
                path: "unchecked_domain".to_string(),
                unchecked: true,
                ..Default::default()
            },
            ModuleConfig {
                path: "ui".to_string(),
                layer: Some("ui".to_string()),
                depends_on: vec![DependencyConfig::from_path("data")],
                ..Default::default()
            },
            ModuleConfig {
                path: "data".to_string(),
                layer: Some("data".to_string()),
                depends_on: vec![DependencyConfig::from_path("ui")],
                ..Default::default()
            },
        ]
    }

    #[fixture]
    pub fn project_config() -> ProjectConfig {
        ProjectConfig {
            modules: fixture_modules(),
            layers: vec!["ui".to_string(), "data".to_string()],
            ..Default::default()
        }
    }

    #[fixture]
    pub fn module_tree() -> ModuleTree {
        let mut tree = ModuleTree::new();
        for module in fixture_modules() {
            let path = module.mod_path();
            let interface_members = if path == "domain_one" {
                vec!["public_fn".to_string()]
            } else {
                vec![]
            };
            tree.insert(module, path, interface_members)
                .expect("fixture modules insert cleanly");
        }
        tree
    }
}
