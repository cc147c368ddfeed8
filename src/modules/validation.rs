use std::collections::HashSet;

use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;

use crate::config::ModuleConfig;

pub fn find_duplicate_modules(modules: &[ModuleConfig]) -> Vec<&String> {
    let mut duplicate_module_paths = Vec::new();
    let mut seen = HashSet::new();

    for module in modules {
        if seen.contains(&module.path) {
            duplicate_module_paths.push(&module.path);
        } else {
            seen.insert(&module.path);
        }
    }

    duplicate_module_paths
}

/// Rotate a cycle so it starts at its lexicographically smallest member,
/// keeping the relative order of the remaining members.
fn rotate_cycle(mut cycle: Vec<String>) -> Vec<String> {
    if let Some(smallest_index) = cycle
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(index, _)| index)
    {
        cycle.rotate_left(smallest_index);
    }
    cycle
}

/// Find cycles in the declared dependency graph via Tarjan's SCC algorithm.
///
/// Each returned cycle is rotated to start with its smallest member so that
/// reporting is deterministic.
pub fn find_cycles(modules: &[ModuleConfig]) -> Vec<Vec<String>> {
    let mut graph = DiGraphMap::new();

    for module in modules {
        graph.add_node(module.path.as_str());
    }

    for module in modules {
        for dependency in module.dependencies_iter() {
            graph.add_edge(module.path.as_str(), dependency.path.as_str(), ());
        }
    }

    let sccs = tarjan_scc(&graph);

    let mut cycles = Vec::new();
    for scc in sccs {
        if scc.len() > 1 {
            cycles.push(rotate_cycle(
                scc.into_iter().map(|path| path.to_string()).collect(),
            ));
        }
    }

    cycles.sort();
    cycles
}
