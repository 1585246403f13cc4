//! Module trie construction from the pruned, collapsed node mapping.
//!
//! Modules are identified by absolute path: the root is the empty string and
//! every other path ends with the delimiter (`a/`, `a/b/`). Building walks
//! each node's ancestor chain once, registering child segments, and then
//! walks each input edge to record the module boundaries it crosses.

use crate::config::PipelineConfig;
use crate::diagnostics;
use crate::graph::node::{NodeMap, Shape};

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

/// Per-module bookkeeping collected during the single build pass.
///
/// `modules` and `op_nodes` hold direct child segments relative to this
/// module. `in_nodes`/`out_nodes` hold full names of nodes outside this
/// module that feed into it / consume out of it (at any nesting depth), with
/// the producer shapes mirrored into `in_shapes`/`out_shapes` for rendering
/// the module as a single collapsed node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleEntry {
    pub modules: BTreeSet<String>,
    pub op_nodes: BTreeSet<String>,
    pub in_nodes: BTreeSet<String>,
    pub in_shapes: BTreeSet<Shape>,
    pub out_nodes: BTreeSet<String>,
    pub out_shapes: BTreeSet<Shape>,
    pub params: BTreeSet<String>,
}

/// The built module tree: immutable after construction, safe to share
/// read-only across concurrent exports (all data is owned, so `Modu` is
/// `Send + Sync`; publish a finished tree behind an `Arc` and never mutate).
#[derive(Debug, Clone)]
pub struct Modu {
    cfg: PipelineConfig,
    modules: BTreeMap<String, ModuleEntry>,
    nodes: NodeMap,
    params_enabled: bool,
}

impl Modu {
    /// Root module path (empty string).
    pub fn root(&self) -> &str {
        ""
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    /// All registered module paths, root first.
    pub fn module_paths(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn module(&self, path: &str) -> Option<&ModuleEntry> {
        self.modules.get(path)
    }

    /// The frozen node mapping the tree was built from.
    pub fn nodes(&self) -> &NodeMap {
        &self.nodes
    }

    pub(crate) fn params_enabled(&self) -> bool {
        self.params_enabled
    }
}

/// Build the module trie from the flat mapping. `params` is the optional
/// list of fully-qualified parameter names; when supplied, modules whose
/// bracket-indexed path pattern matches a parameter own it.
pub fn build_modu(
    nodes: NodeMap,
    params: Option<&[String]>,
    cfg: &PipelineConfig,
) -> crate::Result<Modu> {
    let bracket = Regex::new(r"\[(.*?)\]")?;

    let mut modules: BTreeMap<String, ModuleEntry> = BTreeMap::new();
    modules.insert(String::new(), ModuleEntry::default());

    for (name, node) in &nodes {
        let (ancestors, op_node) = cfg.split_name(name);

        // [1] Register ancestor modules and the op node itself.
        let param_pattern = bracket
            .captures_iter(name)
            .map(|c| c[1].to_string())
            .collect::<Vec<_>>()
            .join(".");

        let mut mod_name = String::new();
        for module in &ancestors {
            modules
                .entry(mod_name.clone())
                .or_default()
                .modules
                .insert(module.to_string());
            mod_name.push_str(module);
            mod_name.push(cfg.delimiter);

            if let Some(params) = params {
                let entry = modules.entry(mod_name.clone()).or_default();
                for leaf in &cfg.param_leaf_segments {
                    let qualified = format!("{param_pattern}.{leaf}");
                    if params.contains(&qualified) {
                        entry.params.insert(qualified);
                    }
                }
            }
        }
        modules
            .entry(mod_name)
            .or_default()
            .op_nodes
            .insert(op_node.to_string());

        // [2] Record boundary crossings for every input edge.
        for in_name in &node.input {
            let Some(in_node) = nodes.get(in_name) else {
                diagnostics::warn(format!(
                    "skipping unresolved edge {:?} -> {:?}",
                    in_name, name
                ));
                continue;
            };
            let out_shapes = &in_node.output_shapes;
            let (in_ancestors, _) = cfg.split_name(in_name);

            let mut out_mod = String::new();
            let mut in_mod = String::new();

            // [2.1] Lock-step walk over the shared depth. Once the paths
            // diverge the edge crosses every deeper level on both sides.
            let mut is_link = false;
            let shared = ancestors.len().min(in_ancestors.len());
            for idx in 0..shared {
                out_mod.push_str(ancestors[idx]);
                out_mod.push(cfg.delimiter);
                in_mod.push_str(in_ancestors[idx]);
                in_mod.push(cfg.delimiter);

                if ancestors[idx] != in_ancestors[idx] || is_link {
                    is_link = true;
                    record_in(&mut modules, &out_mod, in_name, out_shapes);
                    record_out(&mut modules, &in_mod, name, out_shapes);
                }
            }

            // [2.2] Consumer nested deeper: the producer is an input to every
            // remaining consumer-side level (never an output of them).
            if in_ancestors.len() < ancestors.len() {
                for segment in &ancestors[shared..] {
                    out_mod.push_str(segment);
                    out_mod.push(cfg.delimiter);
                    record_in(&mut modules, &out_mod, in_name, out_shapes);
                }
            }
            // [2.3] Producer nested deeper: mirror case.
            else if in_ancestors.len() > ancestors.len() {
                for segment in &in_ancestors[shared..] {
                    in_mod.push_str(segment);
                    in_mod.push(cfg.delimiter);
                    record_out(&mut modules, &in_mod, name, out_shapes);
                }
            }
        }
    }

    Ok(Modu {
        cfg: cfg.clone(),
        modules,
        nodes,
        params_enabled: params.is_some(),
    })
}

fn record_in(
    modules: &mut BTreeMap<String, ModuleEntry>,
    path: &str,
    producer: &str,
    shapes: &[Shape],
) {
    let entry = modules.entry(path.to_string()).or_default();
    entry.in_nodes.insert(producer.to_string());
    for shape in shapes {
        entry.in_shapes.insert(shape.clone());
    }
}

fn record_out(
    modules: &mut BTreeMap<String, ModuleEntry>,
    path: &str,
    consumer: &str,
    shapes: &[Shape],
) {
    let entry = modules.entry(path.to_string()).or_default();
    entry.out_nodes.insert(consumer.to_string());
    for shape in shapes {
        entry.out_shapes.insert(shape.clone());
    }
}
