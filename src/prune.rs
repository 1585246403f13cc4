//! Node pruner: removes primitive bookkeeping ops while preserving the
//! tensor dependency chain, folds parameter leaves into synthetic param
//! nodes, then rebuilds the derived reverse edges and input shapes.
//!
//! The worklist starts at the output frontier (nodes nobody consumes) and
//! walks producers breadth-first. A node that absorbs a primitive producer
//! is re-enqueued so chained primitives resolve to a fixed point; the
//! iteration budget guards against cyclic inputs.

use crate::config::PipelineConfig;
use crate::diagnostics;
use crate::error::VisuError;
use crate::graph::node::{Node, NodeMap};

use std::collections::{BTreeSet, VecDeque};

/// Prune primitive ops and parameter leaves, then derive `output` and
/// `input_shapes` for every surviving node.
pub fn prune_nodes(mut nodes: NodeMap, cfg: &PipelineConfig) -> Result<NodeMap, VisuError> {
    let frontier = output_frontier(&nodes);

    // Budget proportional to graph size; one unit per input reference
    // inspected. An acyclic graph drains well within it.
    let edge_count: usize = nodes.values().map(|n| n.input.len()).sum();
    let budget = (nodes.len() + edge_count + 1).saturating_mul(cfg.prune_round_factor);
    let mut spent = 0usize;

    let mut queue: VecDeque<String> = frontier.iter().cloned().collect();
    let mut seen: BTreeSet<String> = BTreeSet::new();

    while let Some(name) = queue.pop_front() {
        let Some(mut node) = nodes.get(&name).cloned() else {
            continue;
        };
        seen.insert(name.clone());

        let mut absorbed_prim = false;
        let mut del_idxs: Vec<usize> = Vec::new();

        // The input list grows while primitive producers are spliced in;
        // spliced entries are examined in the same sweep.
        let mut idx = 0;
        while idx < node.input.len() {
            spent += 1;
            if spent > budget {
                return Err(VisuError::CyclicGraph { iterations: spent });
            }

            let input_name = node.input[idx].clone();
            let producer = nodes
                .get(&input_name)
                .map(|p| (cfg.is_prim(&p.op), p.op == cfg.param_op));

            match producer {
                // Tolerate tracer inconsistencies: drop the reference.
                None => {
                    diagnostics::warn(format!(
                        "dropping dangling input {:?} of {:?}",
                        input_name, name
                    ));
                    del_idxs.push(idx);
                }

                // Parameter leaves are folded, never deleted, even when their
                // own category is primitive.
                Some((_, is_param_node))
                    if !is_param_node && cfg.is_param_leaf(&input_name) =>
                {
                    let producer = nodes.remove(&input_name).expect("producer just seen");
                    let folded = cfg.parent_path(&input_name).to_string();

                    let mut param = Node::new(folded.clone(), cfg.param_op.clone());
                    param.output_shapes = producer.output_shapes;
                    nodes.insert(folded.clone(), param);

                    node.input[idx] = folded;
                }

                // Primitive producers are absorbed: their own inputs replace
                // the reference.
                Some((true, _)) => {
                    del_idxs.push(idx);
                    let spliced = nodes[&input_name].input.clone();
                    node.input.extend(spliced);
                    absorbed_prim = true;
                }

                Some(_) => {
                    if !seen.contains(&input_name) {
                        queue.push_back(input_name);
                    }
                }
            }

            idx += 1;
        }

        for idx in del_idxs.into_iter().rev() {
            node.input.remove(idx);
        }
        nodes.insert(name.clone(), node);

        // Fixed point per node: one more pass after absorbing primitives.
        if absorbed_prim {
            queue.push_back(name);
        }
    }

    // Sweep out primitives that were never reached (dead constants).
    let dead: Vec<String> = nodes
        .values()
        .filter(|n| cfg.is_prim(&n.op))
        .map(|n| n.name.clone())
        .collect();
    for name in dead {
        nodes.remove(&name);
    }

    link_outputs(&mut nodes);
    Ok(nodes)
}

/// Names that appear as nobody's input: the BFS roots.
fn output_frontier(nodes: &NodeMap) -> BTreeSet<String> {
    let mut frontier: BTreeSet<String> = nodes.keys().cloned().collect();
    for node in nodes.values() {
        for input in &node.input {
            frontier.remove(input);
        }
    }
    frontier
}

/// Rebuild the derived fields for every node: drop inputs that no longer
/// resolve, then append reverse `output` edges and copy producer output
/// shapes into consumer `input_shapes` positionally.
fn link_outputs(nodes: &mut NodeMap) {
    let names: Vec<String> = nodes.keys().cloned().collect();
    let live: BTreeSet<&String> = names.iter().collect();

    for node in nodes.values_mut() {
        node.output.clear();
        node.input_shapes.clear();
    }

    for name in &names {
        let node = nodes.get_mut(name).expect("snapshot name present");
        let before = node.input.len();
        node.input.retain(|input| live.contains(input));
        if node.input.len() != before {
            diagnostics::warn(format!("dropped unresolved inputs of {:?}", name));
        }
    }

    for name in &names {
        let inputs = nodes[name].input.clone();
        let mut shapes = Vec::new();
        for input in &inputs {
            shapes.extend(nodes[input].output_shapes.iter().cloned());
            nodes
                .get_mut(input)
                .expect("retained inputs resolve")
                .output
                .push(name.clone());
        }
        nodes.get_mut(name).expect("snapshot name present").input_shapes = shapes;
    }
}
