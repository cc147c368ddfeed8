use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::pattern::PatternMatcher;

#[derive(Error, Debug)]
pub enum PathExclusionError {
    #[error("Failed to build regex exclude pattern: '{exclude}'\n{source}")]
    RegexPattern {
        exclude: String,
        #[source]
        source: regex::Error,
    },
    #[error("Failed to build glob exclude pattern: '{exclude}'\n{source}")]
    GlobPattern {
        exclude: String,
        #[source]
        source: glob::PatternError,
    },
}

pub type Result<T> = std::result::Result<T, PathExclusionError>;

/// Compiled exclude patterns, matched against project-relative paths.
///
/// Directory exclusion is expressed by matching every ancestor of a candidate
/// path, with and without a trailing separator.
pub struct PathExclusions {
    project_root: PathBuf,
    patterns: Vec<PatternMatcher>,
}

impl PathExclusions {
    pub fn new(
        project_root: &Path,
        exclude_paths: &[String],
        use_regex_matching: bool,
    ) -> Result<Self> {
        let mut patterns: Vec<PatternMatcher> = vec![];
        for pattern in exclude_paths.iter() {
            patterns.push(if use_regex_matching {
                PatternMatcher::from_regex(pattern)?
            } else {
                PatternMatcher::from_glob(pattern)?
            });
        }
        Ok(Self {
            project_root: project_root.to_path_buf(),
            patterns,
        })
    }

    pub fn empty(project_root: &Path) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            patterns: vec![],
        }
    }

    pub fn is_path_excluded<P: AsRef<Path>>(&self, path: P) -> bool {
        if self.patterns.is_empty() {
            return false;
        }

        let relative_path = match path.as_ref().strip_prefix(&self.project_root) {
            Ok(relative) => relative,
            Err(_) => return false,
        };
        let path_str = relative_path.to_string_lossy();

        for pattern in &self.patterns {
            if pattern.matches(&path_str) {
                return true;
            }
        }

        // A path is also excluded when any containing directory is excluded.
        let mut ancestor = String::new();
        let components: Vec<&str> = path_str.split(std::path::MAIN_SEPARATOR).collect();
        let ancestor_components = if components.is_empty() {
            &components[..]
        } else {
            &components[..components.len() - 1]
        };
        for component in ancestor_components {
            if !ancestor.is_empty() {
                ancestor.push(std::path::MAIN_SEPARATOR);
            }
            ancestor.push_str(component);
            for pattern in &self.patterns {
                if pattern.matches(&ancestor) || pattern.matches(&format!("{}/", ancestor)) {
                    return true;
                }
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("tests/test_app.py", true)]
    #[case("docs/index.py", true)]
    #[case("src/app/main.py", false)]
    fn default_style_regex_excludes(#[case] relative: &str, #[case] expected: bool) {
        let root = Path::new("/project");
        let exclusions = PathExclusions::new(
            root,
            &["tests".to_string(), "docs".to_string()],
            true,
        )
        .unwrap();
        assert_eq!(exclusions.is_path_excluded(root.join(relative)), expected);
    }

    #[rstest]
    #[case("src/tests/test_app.py", true)]
    #[case("src/app/main.py", false)]
    #[case("lib/__pycache__/app.cpython-311.py", true)]
    fn glob_excludes_apply_to_directories(#[case] relative: &str, #[case] expected: bool) {
        let root = Path::new("/project");
        let exclusions = PathExclusions::new(
            root,
            &["**/tests".to_string(), "**/*__pycache__".to_string()],
            false,
        )
        .unwrap();
        assert_eq!(exclusions.is_path_excluded(root.join(relative)), expected);
    }

    #[test]
    fn paths_outside_the_project_root_are_not_excluded() {
        let exclusions =
            PathExclusions::new(Path::new("/project"), &["tests".to_string()], true).unwrap();
        assert!(!exclusions.is_path_excluded("/elsewhere/tests/test_app.py"));
    }
}
