use itertools::Itertools;

use crate::config::{ModuleConfig, ProjectConfig};

fn sanitize_mermaid_id(name: &str) -> String {
    name.replace('.', "_").replace('<', "").replace('>', "")
}

fn included<'a>(
    project_config: &'a ProjectConfig,
    included_paths: &[String],
) -> Vec<&'a ModuleConfig> {
    project_config
        .modules
        .iter()
        .filter(|module| {
            included_paths.is_empty()
                || included_paths.iter().any(|included_path| {
                    module.path == *included_path
                        || module
                            .path
                            .starts_with(&format!("{}.", included_path))
                })
        })
        .sorted_by(|a, b| a.path.cmp(&b.path))
        .collect()
}

/// Render the declared dependency graph in DOT format.
///
/// Output is deterministic: modules and edges appear in lexical order.
pub fn generate_module_graph_dot(
    project_config: &ProjectConfig,
    included_paths: &[String],
) -> String {
    let modules = included(project_config, included_paths);

    let mut result = String::from("digraph {\n");
    for module in &modules {
        result.push_str(&format!("    \"{}\";\n", module.path));
    }
    for module in &modules {
        for dependency in module.dependencies_iter().sorted_by(|a, b| a.path.cmp(&b.path)) {
            result.push_str(&format!(
                "    \"{}\" -> \"{}\";\n",
                module.path, dependency.path
            ));
        }
    }
    result.push_str("}\n");
    result
}

/// Render the declared dependency graph as a Mermaid flowchart.
pub fn generate_module_graph_mermaid(
    project_config: &ProjectConfig,
    included_paths: &[String],
) -> String {
    let modules = included(project_config, included_paths);

    let mut result = String::from("graph TD\n");
    for module in &modules {
        result.push_str(&format!(
            "    {}[\"{}\"]\n",
            sanitize_mermaid_id(&module.path),
            module.path
        ));
    }
    for module in &modules {
        for dependency in module.dependencies_iter().sorted_by(|a, b| a.path.cmp(&b.path)) {
            result.push_str(&format!(
                "    {} --> {}\n",
                sanitize_mermaid_id(&module.path),
                sanitize_mermaid_id(&dependency.path)
            ));
        }
    }
    result
}
