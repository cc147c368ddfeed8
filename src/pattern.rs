use crate::exclusion::PathExclusionError;

pub enum PatternMatcher {
    Regex(regex::Regex),
    Glob(glob::Pattern),
}

impl PatternMatcher {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            PatternMatcher::Regex(re) => re.is_match(text),
            PatternMatcher::Glob(pattern) => pattern.matches(text),
        }
    }

    /// Regex patterns match from the start of the candidate path.
    pub fn from_regex(pattern: &str) -> Result<Self, PathExclusionError> {
        Ok(PatternMatcher::Regex(
            regex::Regex::new(&format!("^(?:{})", pattern)).map_err(|e| {
                PathExclusionError::RegexPattern {
                    exclude: pattern.to_string(),
                    source: e,
                }
            })?,
        ))
    }

    pub fn from_glob(pattern: &str) -> Result<Self, PathExclusionError> {
        Ok(PatternMatcher::Glob(glob::Pattern::new(pattern).map_err(
            |e| PathExclusionError::GlobPattern {
                exclude: pattern.to_string(),
                source: e,
            },
        )?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("tests", "tests/test_app.py", true)]
    #[case("tests", "src/tests", false)]
    #[case(".*__pycache__", "lib/__pycache__", true)]
    #[case("domain_.*", "domain_one/api.py", true)]
    fn regex_patterns_anchor_at_the_start(
        #[case] pattern: &str,
        #[case] path: &str,
        #[case] expected: bool,
    ) {
        let matcher = PatternMatcher::from_regex(pattern).unwrap();
        assert_eq!(matcher.matches(path), expected);
    }

    #[rstest]
    #[case("**/tests", "src/tests", true)]
    #[case("**/*__pycache__", "lib/__pycache__", true)]
    #[case("docs", "docs", true)]
    #[case("docs", "docs/index.md", false)]
    fn glob_patterns_match_whole_paths(
        #[case] pattern: &str,
        #[case] path: &str,
        #[case] expected: bool,
    ) {
        let matcher = PatternMatcher::from_glob(pattern).unwrap();
        assert_eq!(matcher.matches(path), expected);
    }

    #[test]
    fn invalid_regex_is_rejected() {
        assert!(PatternMatcher::from_regex("(unclosed").is_err());
    }
}
