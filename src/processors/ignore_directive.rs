use std::collections::hash_map::Entry;
use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone)]
pub struct IgnoreDirective {
    /// Fully-qualified module paths the directive suppresses; empty means a
    /// blanket ignore of the whole statement.
    pub modules: Vec<String>,
    pub reason: String,
    pub line_no: usize,         // Where the directive is literally written
    pub ignored_line_no: usize, // Where the directive is applied
}

#[derive(Debug, Default, Clone)]
pub struct IgnoreDirectives {
    directives: HashMap<usize, IgnoreDirective>,
    redundant_directives: Vec<IgnoreDirective>,
}

impl IgnoreDirectives {
    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    pub fn add_directive(&mut self, directive: IgnoreDirective) {
        match self.directives.entry(directive.ignored_line_no) {
            Entry::Occupied(_) => {
                self.redundant_directives.push(directive);
            }
            Entry::Vacant(entry) => {
                entry.insert(directive);
            }
        }
    }

    pub fn get(&self, line_no: &usize) -> Option<&IgnoreDirective> {
        self.directives.get(line_no)
    }

    pub fn sorted_directives(&self) -> impl Iterator<Item = &IgnoreDirective> {
        let mut directives = self.directives.values().collect::<Vec<_>>();
        directives.sort_by_key(|directive| directive.ignored_line_no);
        directives.into_iter()
    }

    pub fn redundant_directives(&self) -> impl Iterator<Item = &IgnoreDirective> {
        self.redundant_directives.iter()
    }
}

static FENCE_IGNORE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"# *fence-ignore(?:\(([^)]*)\))?((?:\s+[\w.]+)*)\s*$").unwrap());

/// Build the line-indexed directive map for a source file.
///
/// A directive on its own comment line applies to the following line; a
/// trailing comment applies to its own line.
pub fn get_ignore_directives(file_content: &str) -> IgnoreDirectives {
    if !file_content.contains("fence-ignore") {
        return IgnoreDirectives::default();
    }

    let mut ignores = IgnoreDirectives::default();

    for (lineno, line) in file_content.lines().enumerate() {
        if !line.contains("fence-ignore") {
            continue;
        }

        let normal_lineno = lineno + 1;
        if let Some(captures) = FENCE_IGNORE_REGEX.captures(line) {
            let reason = captures
                .get(1)
                .map_or("".to_string(), |m| m.as_str().to_string());
            let ignored_modules = captures.get(2).map_or("", |m| m.as_str());
            let modules: Vec<String> = if ignored_modules.is_empty() {
                Vec::new()
            } else {
                ignored_modules
                    .split_whitespace()
                    .map(|module| module.to_string())
                    .collect()
            };

            let mut ignored_line_no = normal_lineno;
            if line.trim_start().starts_with('#') {
                ignored_line_no = normal_lineno + 1;
            }
            let directive = IgnoreDirective {
                modules,
                reason,
                line_no: normal_lineno,
                ignored_line_no,
            };

            ignores.add_directive(directive);
        }
    }

    ignores
}
