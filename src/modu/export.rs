//! Per-module metadata exports.
//!
//! An export is a self-contained view of one module: its direct op nodes,
//! the boundary nodes feeding in and out, and one synthetic entry per direct
//! submodule. References that point deeper than one level below the exported
//! module are rewritten to name the enclosing submodule instead, so callers
//! can render a level without knowing anything about the rest of the tree.
//! Exports never mutate the tree; every call builds a fresh view.

use crate::diagnostics;
use crate::error::VisuError;
use crate::graph::node::{Node, Shape};
use crate::modu::tree::{Modu, ModuleEntry};

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Exported metadata for a single node or synthetic module entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub name: String,
    pub op: String,
    pub input: Vec<String>,
    pub output: Vec<String>,
    pub input_shapes: Vec<Shape>,
    pub output_shapes: Vec<Shape>,
    /// Parameter names owned by a module entry; present only when parameter
    /// association was enabled at build time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<String>>,
}

impl NodeView {
    fn from_node(node: &Node) -> Self {
        Self {
            name: node.name.clone(),
            op: node.op.clone(),
            input: node.input.clone(),
            output: node.output.clone(),
            input_shapes: node.input_shapes.clone(),
            output_shapes: node.output_shapes.clone(),
            params: None,
        }
    }
}

/// The sole contract consumed by layout/rendering collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleExport {
    pub meta: BTreeMap<String, NodeView>,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

impl Modu {
    /// Export the metadata view of the module at `path` (absolute, ending in
    /// the delimiter unless it is the root).
    pub fn export(&self, path: &str) -> Result<ModuleExport, VisuError> {
        let module = self
            .module(path)
            .ok_or_else(|| VisuError::UnknownModule { path: path.to_string() })?;

        let mut meta: BTreeMap<String, NodeView> = BTreeMap::new();

        // Direct op nodes, full metadata.
        for op_node in &module.op_nodes {
            let full = format!("{path}{op_node}");
            let Some(node) = self.nodes().get(&full) else {
                diagnostics::warn(format!("op node {:?} missing from node mapping", full));
                continue;
            };
            meta.insert(full, self.fix_links(path, module, NodeView::from_node(node)));
        }

        // Boundary in-nodes are presented as sources: their own inputs are
        // not visible at this level.
        for in_name in &module.in_nodes {
            let Some(node) = self.nodes().get(in_name) else {
                diagnostics::warn(format!("in node {:?} missing from node mapping", in_name));
                continue;
            };
            let mut view = NodeView::from_node(node);
            view.input = Vec::new();
            meta.insert(in_name.clone(), self.fix_links(path, module, view));
        }

        // Boundary out-nodes, symmetrically, hide their own consumers.
        for out_name in &module.out_nodes {
            let Some(node) = self.nodes().get(out_name) else {
                diagnostics::warn(format!("out node {:?} missing from node mapping", out_name));
                continue;
            };
            let mut view = NodeView::from_node(node);
            view.output = Vec::new();
            meta.insert(out_name.clone(), self.fix_links(path, module, view));
        }

        // One synthetic entry per direct submodule, aggregating its boundary
        // sets so it can be rendered as a single collapsed node.
        for submodule in &module.modules {
            let sub_name = format!("{path}{submodule}{}", self.config().delimiter);
            let Some(entry) = self.module(&sub_name) else {
                diagnostics::warn(format!("submodule {:?} was never registered", sub_name));
                continue;
            };
            let view = NodeView {
                name: sub_name.clone(),
                op: self.config().module_op.clone(),
                input: entry.in_nodes.iter().cloned().collect(),
                output: entry.out_nodes.iter().cloned().collect(),
                input_shapes: entry.in_shapes.iter().cloned().collect(),
                output_shapes: entry.out_shapes.iter().cloned().collect(),
                params: self
                    .params_enabled()
                    .then(|| entry.params.iter().cloned().collect()),
            };
            meta.insert(sub_name, self.fix_links(path, module, view));
        }

        Ok(ModuleExport {
            meta,
            inputs: module.in_nodes.iter().cloned().collect(),
            outputs: module.out_nodes.iter().cloned().collect(),
        })
    }

    /// Rewrite edge references that reach into a submodule of the exported
    /// module so they name the submodule itself, then sort and deduplicate
    /// (fan-out through one submodule collapses to a single edge).
    fn fix_links(&self, path: &str, module: &ModuleEntry, mut view: NodeView) -> NodeView {
        let delimiter = self.config().delimiter;

        let rewrite = |links: &mut Vec<String>| {
            for link in links.iter_mut() {
                if let Some(rest) = link.strip_prefix(path) {
                    let sub_name = rest.split(delimiter).next().unwrap_or(rest);
                    if module.modules.contains(sub_name) {
                        *link = format!("{path}{sub_name}{delimiter}");
                    }
                }
            }
            let deduped: BTreeSet<String> = std::mem::take(links).into_iter().collect();
            *links = deduped.into_iter().collect();
        };

        rewrite(&mut view.input);
        rewrite(&mut view.output);
        view
    }
}
