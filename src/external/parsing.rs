use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use toml::Value;

use super::error::Result;

pub struct ProjectInfo {
    pub name: Option<String>,
    pub dependencies: HashSet<String>,
    pub source_paths: Vec<PathBuf>,
}

pub fn parse_pyproject_toml(pyproject_path: &Path) -> Result<ProjectInfo> {
    let content = fs::read_to_string(pyproject_path)?;
    let toml_value: Value = toml::from_str(&content)?;
    let name = extract_project_name(&toml_value);
    let dependencies = extract_dependencies(&toml_value);
    let source_paths = extract_source_paths(
        &toml_value,
        pyproject_path.parent().unwrap_or(Path::new(".")),
    );
    Ok(ProjectInfo {
        name,
        dependencies,
        source_paths,
    })
}

fn extract_project_name(toml_value: &Value) -> Option<String> {
    toml_value
        .get("project")
        .and_then(|p| p.get("name"))
        .and_then(|n| n.as_str())
        .map(|s| s.to_string())
}

const EXCLUDED_DEPS: [&str; 3] = ["python", "poetry", "poetry-core"];

fn extract_dependencies(toml_value: &Value) -> HashSet<String> {
    let mut dependencies = HashSet::new();

    // Standard pyproject.toml dependencies take precedence
    let has_project_deps = toml_value
        .get("project")
        .and_then(|p| p.get("dependencies"))
        .is_some_and(|deps| {
            extract_deps_from_value(&mut dependencies, deps);
            true
        });

    if !has_project_deps {
        if let Some(deps) = toml_value
            .get("tool")
            .and_then(|tool| tool.get("poetry"))
            .and_then(|poetry| poetry.get("dependencies"))
        {
            extract_deps_from_value(&mut dependencies, deps)
        }
    }

    dependencies
}

fn extract_deps_from_value(dependencies: &mut HashSet<String>, deps: &Value) {
    match deps {
        Value::Array(deps_array) => {
            for dep_str in deps_array.iter().filter_map(|dep| dep.as_str()) {
                let pkg_name = normalize_package_name(&extract_package_name(dep_str));
                if !EXCLUDED_DEPS.contains(&pkg_name.as_str()) {
                    dependencies.insert(pkg_name);
                }
            }
        }
        Value::Table(deps_table) => {
            for dep_name in deps_table.keys() {
                let pkg_name = normalize_package_name(&extract_package_name(dep_name));
                if !EXCLUDED_DEPS.contains(&pkg_name.as_str()) {
                    dependencies.insert(pkg_name);
                }
            }
        }
        _ => {}
    }
}

fn extract_package_name(dep_str: &str) -> String {
    // Split on requirement-specifier separators and take the first part
    dep_str
        .split(&[' ', '=', '<', '>', '~', '!', ';', '['][..])
        .next()
        .unwrap_or(dep_str)
        .to_string()
}

/// Normalize a distribution name the way package indexes do.
pub fn normalize_package_name(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_' || c == '.')
        .filter(|s| !s.is_empty())
        .collect::<Vec<&str>>()
        .join("_")
}

fn extract_source_paths(toml_value: &Value, project_root: &Path) -> Vec<PathBuf> {
    let mut source_paths = Vec::new();

    // setuptools configuration
    if let Some(packages) = toml_value
        .get("tool")
        .and_then(|t| t.get("setuptools"))
        .and_then(|setuptools| setuptools.get("packages"))
        .and_then(|p| p.as_array())
    {
        for package_name in packages.iter().filter_map(|package| package.as_str()) {
            source_paths.push(project_root.join(package_name));
        }
    }

    // poetry configuration
    if let Some(packages) = toml_value
        .get("tool")
        .and_then(|t| t.get("poetry"))
        .and_then(|p| p.get("packages"))
        .and_then(|p| p.as_array())
    {
        for package in packages {
            if let Some(include) = package.get("include").and_then(|i| i.as_str()) {
                let from = package.get("from").and_then(|f| f.as_str()).unwrap_or("");
                source_paths.push(project_root.join(from).join(include));
            }
        }
    }

    // Fall back to conventional locations
    if source_paths.is_empty() {
        let src_dir = project_root.join("src");
        if src_dir.exists() {
            source_paths.push(src_dir);
        } else {
            source_paths.push(project_root.to_path_buf());
        }
    }

    source_paths
}

pub fn parse_requirements_txt(requirements_path: &Path) -> Result<HashSet<String>> {
    let content = fs::read_to_string(requirements_path)?;
    let mut dependencies = HashSet::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Options (lines starting with '-') are not requirements
        if line.starts_with('-') {
            continue;
        }

        let package_name = extract_package_name(line);
        let normalized_name = normalize_package_name(&package_name);

        if !EXCLUDED_DEPS.contains(&normalized_name.as_str()) {
            dependencies.insert(normalized_name);
        }
    }

    Ok(dependencies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("requests", "requests")]
    #[case("Django", "django")]
    #[case("scikit-learn", "scikit_learn")]
    #[case("ruamel.yaml", "ruamel_yaml")]
    #[case("zope_interface", "zope_interface")]
    fn package_names_are_normalized(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_package_name(raw), expected);
    }

    #[test]
    fn pep621_dependencies_are_extracted() {
        let scratch = tempfile::tempdir().unwrap();
        let manifest = scratch.path().join("pyproject.toml");
        fs::write(
            &manifest,
            r#"
[project]
name = "widgets"
dependencies = ["requests>=2.0", "GitPython == 3.1", "typing-extensions; python_version < '3.11'"]
"#,
        )
        .unwrap();

        let info = parse_pyproject_toml(&manifest).unwrap();
        assert_eq!(info.name.as_deref(), Some("widgets"));
        assert_eq!(
            info.dependencies,
            HashSet::from([
                "requests".to_string(),
                "gitpython".to_string(),
                "typing_extensions".to_string(),
            ])
        );
    }

    #[test]
    fn poetry_dependencies_are_a_fallback() {
        let scratch = tempfile::tempdir().unwrap();
        let manifest = scratch.path().join("pyproject.toml");
        fs::write(
            &manifest,
            r#"
[tool.poetry.dependencies]
python = "^3.11"
flask = "^3.0"
"#,
        )
        .unwrap();

        let info = parse_pyproject_toml(&manifest).unwrap();
        assert_eq!(info.dependencies, HashSet::from(["flask".to_string()]));
    }

    #[test]
    fn requirements_txt_skips_comments_and_options() {
        let scratch = tempfile::tempdir().unwrap();
        let requirements = scratch.path().join("requirements.txt");
        fs::write(
            &requirements,
            "# pinned\nrequests==2.31.0\n-r other.txt\n\nFlask[async]>=3.0\n",
        )
        .unwrap();

        let deps = parse_requirements_txt(&requirements).unwrap();
        assert_eq!(
            deps,
            HashSet::from(["requests".to_string(), "flask".to_string()])
        );
    }
}
