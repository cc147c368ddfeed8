use std::collections::HashMap;
use std::sync::Arc;

use itertools::Itertools;

use crate::config::ModuleConfig;

use super::error::ModuleTreeError;

/// A node in the module tree.
///
/// If 'is_end_of_path' is true, this node represents a configured module and
/// carries its config and interface members. Otherwise it is a routing stub
/// on the way to deeper modules.
#[derive(PartialEq, Debug)]
pub struct ModuleNode {
    pub is_end_of_path: bool,
    pub full_path: String,
    pub config: Option<ModuleConfig>,
    pub interface_members: Vec<String>,
    pub children: HashMap<String, Arc<ModuleNode>>,
}

impl ModuleNode {
    pub fn empty() -> Self {
        Self {
            is_end_of_path: false,
            full_path: String::new(),
            config: None,
            interface_members: vec![],
            children: HashMap::new(),
        }
    }

    /// The root node is terminal even when not configured explicitly, acting
    /// as a catch-all for top-level modules.
    pub fn implicit_root() -> Self {
        let config = ModuleConfig::new_root_config();
        Self {
            is_end_of_path: true,
            full_path: ".".to_string(),
            config: Some(config),
            interface_members: vec![],
            children: HashMap::new(),
        }
    }

    fn fill(&mut self, config: ModuleConfig, full_path: String, interface_members: Vec<String>) {
        self.is_end_of_path = true;
        self.config = Some(config);
        self.full_path = full_path;
        self.interface_members = interface_members;
    }
}

fn split_module_path(path: &str) -> Vec<&str> {
    if path == "." || path.is_empty() {
        return vec![];
    }
    path.split('.').collect()
}

/// The core lookup structure: a trie over dot-separated module paths.
///
/// Nodes are reference-counted so that lookups can hand out cheap handles and
/// the whole tree can be shared across worker threads.
#[derive(Debug)]
pub struct ModuleTree {
    pub root: Arc<ModuleNode>,
}

impl Default for ModuleTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleTree {
    pub fn new() -> Self {
        Self {
            root: Arc::new(ModuleNode::implicit_root()),
        }
    }

    pub fn get(&self, path: &str) -> Option<Arc<ModuleNode>> {
        if path.is_empty() {
            return None;
        }

        let mut node = Arc::clone(&self.root);
        for part in split_module_path(path) {
            let child = node.children.get(part).map(Arc::clone);
            match child {
                Some(child) => node = child,
                None => return None,
            }
        }

        if node.is_end_of_path {
            Some(node)
        } else {
            None
        }
    }

    pub fn insert(
        &mut self,
        config: ModuleConfig,
        path: String,
        interface_members: Vec<String>,
    ) -> Result<(), ModuleTreeError> {
        if path.is_empty() {
            return Err(ModuleTreeError::InsertNodeError);
        }

        let mut node = Arc::get_mut(&mut self.root)
            .expect("tree is uniquely owned during construction");
        for part in split_module_path(&path) {
            node = Arc::get_mut(
                node.children
                    .entry(part.to_owned())
                    .or_insert(Arc::new(ModuleNode::empty())),
            )
            .expect("tree is uniquely owned during construction");
        }

        // The implicit root is the only terminal which may be overwritten
        if node.is_end_of_path && path != "." {
            return Err(ModuleTreeError::DuplicateModules(vec![path]));
        }

        node.fill(config, path, interface_members);
        Ok(())
    }

    /// The deepest terminal whose full path is a dotted prefix of `path`,
    /// falling back to the root terminal.
    pub fn find_nearest(&self, path: &str) -> Option<Arc<ModuleNode>> {
        let mut node = Arc::clone(&self.root);
        let mut nearest_parent = node.is_end_of_path.then(|| Arc::clone(&node));

        for part in split_module_path(path) {
            let child = node.children.get(part).map(Arc::clone);
            match child {
                Some(child) => {
                    node = child;
                    if node.is_end_of_path {
                        nearest_parent = Some(Arc::clone(&node));
                    }
                }
                None => break,
            }
        }

        nearest_parent
    }

    pub fn module_paths(&self) -> Vec<String> {
        self.iter().map(|node| node.full_path.clone()).collect()
    }

    pub fn iter(&self) -> ModuleTreeIterator {
        ModuleTreeIterator::new(self)
    }
}

/// Depth-first walk over terminal nodes, visiting children in lexical order
/// of their segment so that iteration is deterministic.
pub struct ModuleTreeIterator {
    stack: Vec<Arc<ModuleNode>>,
}

impl ModuleTreeIterator {
    pub fn new(tree: &ModuleTree) -> Self {
        Self {
            stack: vec![Arc::clone(&tree.root)],
        }
    }
}

impl Iterator for ModuleTreeIterator {
    type Item = Arc<ModuleNode>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            for segment in node.children.keys().sorted().rev() {
                self.stack.push(Arc::clone(&node.children[segment]));
            }
            if node.is_end_of_path {
                return Some(node);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn insert_path(tree: &mut ModuleTree, path: &str) {
        tree.insert(ModuleConfig::new(path, false), path.to_string(), vec![])
            .unwrap();
    }

    #[fixture]
    fn tree() -> ModuleTree {
        let mut tree = ModuleTree::new();
        insert_path(&mut tree, "domain_one");
        insert_path(&mut tree, "domain_one.subdomain");
        insert_path(&mut tree, "domain_two");
        insert_path(&mut tree, "domain_two.subdomain.core");
        tree
    }

    #[rstest]
    fn get_returns_exact_terminals(tree: ModuleTree) {
        assert_eq!(
            tree.get("domain_one.subdomain").unwrap().full_path,
            "domain_one.subdomain"
        );
        // routing stubs are not modules
        assert!(tree.get("domain_two.subdomain").is_none());
        assert!(tree.get("domain_three").is_none());
        assert!(tree.get("").is_none());
    }

    #[rstest]
    #[case("domain_one.subdomain.api", "domain_one.subdomain")]
    #[case("domain_one.other", "domain_one")]
    #[case("domain_two.subdomain.core.inner", "domain_two.subdomain.core")]
    #[case("domain_two.subdomain.other", "domain_two")]
    #[case("external", ".")]
    fn find_nearest_returns_the_deepest_prefix(
        tree: ModuleTree,
        #[case] path: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(tree.find_nearest(path).unwrap().full_path, expected);
    }

    #[rstest]
    fn find_nearest_prefers_longer_matches(tree: ModuleTree) {
        let nearest = tree.find_nearest("domain_one.subdomain").unwrap();
        assert_eq!(nearest.full_path, "domain_one.subdomain");
    }

    #[test]
    fn insert_rejects_the_empty_path() {
        let mut tree = ModuleTree::new();
        let result = tree.insert(ModuleConfig::new("", false), String::new(), vec![]);
        assert!(matches!(result, Err(ModuleTreeError::InsertNodeError)));
    }

    #[rstest]
    fn reinserting_a_module_is_an_error(mut tree: ModuleTree) {
        let result = tree.insert(
            ModuleConfig::new("domain_one", false),
            "domain_one".to_string(),
            vec![],
        );
        assert!(matches!(
            result,
            Err(ModuleTreeError::DuplicateModules(paths)) if paths == vec!["domain_one".to_string()]
        ));
    }

    #[rstest]
    fn iteration_is_depth_first_in_lexical_order(tree: ModuleTree) {
        let paths: Vec<String> = tree.iter().map(|node| node.full_path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                ".",
                "domain_one",
                "domain_one.subdomain",
                "domain_two",
                "domain_two.subdomain.core",
            ]
        );
    }
}
