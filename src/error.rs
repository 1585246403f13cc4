//! Typed error kinds surfaced by the pipeline stages.
//!
//! Dangling references are deliberately not here: they are recovered locally
//! (the reference is dropped and a warning printed) and never abort a stage.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VisuError {
    /// A raw record lacked a required field. Aborts ingestion for the
    /// whole snapshot.
    #[error("malformed record at index {index}: missing '{field}' field")]
    MalformedRecord { index: usize, field: &'static str },

    /// The pruning worklist failed to drain within the configured bound,
    /// which means the input graph has a cycle.
    #[error("pruning did not converge after {iterations} iterations; input graph is cyclic")]
    CyclicGraph { iterations: usize },

    /// An export was requested for a module path that was never registered.
    /// A request error, not a pipeline failure.
    #[error("unknown module: {path:?}")]
    UnknownModule { path: String },
}
