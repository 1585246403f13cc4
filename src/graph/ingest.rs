//! Ingestion of raw operation records into the internal node mapping.
//!
//! Record shape (JSON):
//! {
//!   "name": "net/fc1/relu",      // unique hierarchical path
//!   "op": "aten::relu",           // namespaced operation kind
//!   "input": ["net/fc1/addmm"],  // producing nodes, positional
//!   "attributes": {               // opaque tracer attributes
//!     "_output_shapes": [[1, 64]]
//!   }
//! }
//!
//! Only `name` and `op` are required. Everything else defaults to empty and
//! no further validation happens here: duplicate names overwrite silently
//! (the upstream tracer promises unique names), and `output`/`input_shapes`
//! stay empty until the pruner derives them.

use crate::config::PipelineConfig;
use crate::error::VisuError;
use crate::graph::node::{Node, NodeMap, Shape};

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Raw operation record as supplied by the external tracer.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub op: Option<String>,

    #[serde(default)]
    pub input: Vec<String>,

    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

/// Normalize a sequence of raw records into the node mapping.
pub fn ingest_records(
    records: impl IntoIterator<Item = RawRecord>,
    cfg: &PipelineConfig,
) -> Result<NodeMap, VisuError> {
    let mut nodes = NodeMap::new();

    for (index, record) in records.into_iter().enumerate() {
        let name = record
            .name
            .ok_or(VisuError::MalformedRecord { index, field: "name" })?;
        let op = record
            .op
            .ok_or(VisuError::MalformedRecord { index, field: "op" })?;

        let output_shapes = record
            .attributes
            .get(&cfg.output_shapes_attr)
            .map(extract_shapes)
            .unwrap_or_default();

        let mut node = Node::new(name.clone(), op);
        node.input = record.input;
        node.output_shapes = output_shapes;

        // Last write wins on duplicate names.
        nodes.insert(name, node);
    }

    Ok(nodes)
}

/// Pull shape tuples out of the `_output_shapes` attribute value.
/// Entries that are not integer arrays are skipped.
fn extract_shapes(value: &Value) -> Vec<Shape> {
    let Some(shapes) = value.as_array() else {
        return Vec::new();
    };

    shapes
        .iter()
        .filter_map(|shape| {
            let dims = shape.as_array()?;
            dims.iter().map(Value::as_i64).collect::<Option<Shape>>()
        })
        .collect()
}
