//! Internal node representation for the flattened graph.

use serde::Serialize;
use std::collections::BTreeMap;

/// A tensor shape. Dimensions may be -1 for unknown sizes, so they are kept
/// signed; `Vec<i64>` is ordered, which lets shape sets use BTreeSet.
pub type Shape = Vec<i64>;

/// A single operation in the flattened graph.
///
/// `name` is a unique hierarchical path (segments separated by the pipeline
/// delimiter); ancestors of a node are exactly the path prefixes of its name.
/// `output` and `input_shapes` are derived, rebuilt from `input` by the
/// pruner's final pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub name: String,
    /// Operation kind, namespaced as `<category>::<operator>`.
    pub op: String,
    /// Names of producing nodes, in positional order.
    pub input: Vec<String>,
    /// Names of consuming nodes (derived).
    pub output: Vec<String>,
    /// Shapes aligned positionally with `input` (derived).
    pub input_shapes: Vec<Shape>,
    pub output_shapes: Vec<Shape>,
}

impl Node {
    /// A fresh node with no edges or shapes.
    pub fn new(name: impl Into<String>, op: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            op: op.into(),
            input: Vec::new(),
            output: Vec::new(),
            input_shapes: Vec::new(),
            output_shapes: Vec::new(),
        }
    }
}

/// Master mapping of node name to node; deterministic iteration order.
pub type NodeMap = BTreeMap<String, Node>;
