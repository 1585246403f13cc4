//! Module collapser: removes hierarchy levels that contribute no branching.
//!
//! A module whose contents amount to a single entry (one submodule or one op
//! node) only makes the visible tree deeper without adding structure. Such a
//! level is merged into its child by wrapping the segment in parentheses and
//! dropping the delimiter after it, so `p/q/r/x` becomes `p/(q)r/x` when
//! `p/q/` has `r` as its only child. The parenthesized segment no longer
//! reads as a module of its own downstream.

use crate::config::PipelineConfig;
use crate::graph::node::NodeMap;

use std::collections::{BTreeMap, BTreeSet};

/// Collapse every degenerate (single-child) module level and rewrite all
/// node names and edge references consistently.
pub fn collapse_modules(nodes: NodeMap, cfg: &PipelineConfig) -> NodeMap {
    let names: Vec<String> = nodes.keys().cloned().collect();

    // [1] Per-module content sets, to find the arity of every level.
    let mut contents: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for name in &names {
        let (modules, op_node) = cfg.split_name(name);

        let mut mod_name = String::new();
        for module in &modules {
            contents
                .entry(mod_name.clone())
                .or_default()
                .insert(module.to_string());
            mod_name.push_str(module);
            mod_name.push(cfg.delimiter);
        }
        contents
            .entry(mod_name)
            .or_default()
            .insert(op_node.to_string());
    }

    // [2] Collapse points: non-root modules with at most one entry, keyed by
    // the segment index of the module's own last segment. A name passing
    // through several collapse points rewrites each indexed position
    // independently, so chains of degenerate levels collapse in one pass.
    let collapse_points: Vec<(String, usize)> = contents
        .iter()
        .filter(|(path, children)| !path.is_empty() && children.len() <= 1)
        .map(|(path, _)| {
            let depth = path
                .trim_end_matches(cfg.delimiter)
                .split(cfg.delimiter)
                .count();
            (path.clone(), depth - 1)
        })
        .collect();

    // [3] Rewritten name per affected node.
    let mut name_map: BTreeMap<String, String> = BTreeMap::new();
    for name in &names {
        let map_idxs: BTreeSet<usize> = collapse_points
            .iter()
            .filter(|(path, _)| name.starts_with(path.as_str()))
            .map(|&(_, idx)| idx)
            .collect();
        if map_idxs.is_empty() {
            continue;
        }

        let (modules, op_node) = cfg.split_name(name);
        let mut mapped = String::new();
        for (idx, module) in modules.iter().enumerate() {
            if map_idxs.contains(&idx) {
                mapped.push('(');
                mapped.push_str(module);
                mapped.push(')');
            } else {
                mapped.push_str(module);
                mapped.push(cfg.delimiter);
            }
        }
        mapped.push_str(op_node);
        name_map.insert(name.clone(), mapped);
    }

    // [4] Apply the mapping to names and to both edge lists, rekeying the
    // mapping. Distinct prefixes collapse independently, so no two names can
    // land on the same rewritten key.
    let mut rewritten = NodeMap::new();
    for (name, mut node) in nodes {
        let new_name = name_map.get(&name).cloned().unwrap_or(name);
        node.name = new_name.clone();
        for input in &mut node.input {
            if let Some(mapped) = name_map.get(input) {
                *input = mapped.clone();
            }
        }
        for output in &mut node.output {
            if let Some(mapped) = name_map.get(output) {
                *output = mapped.clone();
            }
        }
        rewritten.insert(new_name, node);
    }

    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::Node;
    use pretty_assertions::assert_eq;

    fn node(name: &str, input: &[&str]) -> Node {
        let mut n = Node::new(name, "aten::op");
        n.input = input.iter().map(|s| s.to_string()).collect();
        n
    }

    fn map(nodes: Vec<Node>) -> NodeMap {
        nodes.into_iter().map(|n| (n.name.clone(), n)).collect()
    }

    #[test]
    fn collapses_single_child_module() {
        // Scenario C: p/q/ has only r below it, so q merges into r.
        let cfg = PipelineConfig::default();
        let nodes = map(vec![
            node("p/q/r/x", &[]),
            node("p/q/r/y", &["p/q/r/x"]),
            node("p/z", &["p/q/r/y"]),
        ]);

        let collapsed = collapse_modules(nodes, &cfg);
        assert!(collapsed.contains_key("p/(q)r/x"));
        assert!(collapsed.contains_key("p/(q)r/y"));
        assert_eq!(collapsed["p/(q)r/y"].input, vec!["p/(q)r/x".to_string()]);
        assert_eq!(collapsed["p/z"].input, vec!["p/(q)r/y".to_string()]);
    }

    #[test]
    fn keeps_branching_modules() {
        let cfg = PipelineConfig::default();
        let nodes = map(vec![node("a/b/x", &[]), node("a/b/y", &[]), node("a/c", &[])]);
        let collapsed = collapse_modules(nodes.clone(), &cfg);
        assert_eq!(collapsed, nodes);
    }

    #[test]
    fn collapses_degenerate_chain_in_one_pass() {
        // p/q/ and p/q/r/ are both single-child levels.
        let cfg = PipelineConfig::default();
        let nodes = map(vec![node("p/q/r/x", &[]), node("p/w", &[])]);
        let collapsed = collapse_modules(nodes, &cfg);
        assert!(collapsed.contains_key("p/(q)(r)x"));
    }

    #[test]
    fn root_is_never_collapsed() {
        // Everything under one top-level module: root has arity 1 but stays.
        let cfg = PipelineConfig::default();
        let nodes = map(vec![node("net/a", &[]), node("net/b", &["net/a"])]);
        let collapsed = collapse_modules(nodes, &cfg);
        assert!(collapsed.contains_key("net/a"));
        assert!(collapsed.contains_key("net/b"));
    }

    #[test]
    fn sibling_prefix_is_not_a_collapse_match() {
        // a/b/ is degenerate; a/bb/ merely shares the text prefix.
        let cfg = PipelineConfig::default();
        let nodes = map(vec![
            node("a/b/x", &[]),
            node("a/bb/x", &[]),
            node("a/bb/y", &[]),
        ]);
        let collapsed = collapse_modules(nodes, &cfg);
        assert!(collapsed.contains_key("a/(b)x"));
        assert!(collapsed.contains_key("a/bb/x"));
        assert!(collapsed.contains_key("a/bb/y"));
    }

    #[test]
    fn collapse_is_idempotent() {
        let cfg = PipelineConfig::default();
        let nodes = map(vec![
            node("p/q/r/x", &[]),
            node("p/q/r/y", &["p/q/r/x"]),
            node("p/z", &["p/q/r/y"]),
        ]);
        let once = collapse_modules(nodes, &cfg);
        let twice = collapse_modules(once.clone(), &cfg);
        assert_eq!(once, twice);
    }
}
