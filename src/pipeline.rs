//! Pipeline orchestration: one batch run per graph snapshot.
//!
//! The four build stages run sequentially and single-threaded; a failure in
//! any stage aborts the snapshot (construction is deterministic, so there is
//! nothing to retry). The finished [`Modu`] is frozen — publish it once
//! (e.g. swap an `Arc`) and serve exports from it concurrently without
//! locks. There is no incremental update: a new snapshot replaces the tree.

use crate::Result;
use crate::collapse::collapse_modules;
use crate::config::PipelineConfig;
use crate::graph::ingest::{RawRecord, ingest_records};
use crate::modu::tree::{Modu, build_modu};
use crate::prune::prune_nodes;

/// Run ingest -> prune -> collapse -> build on one snapshot of raw records.
pub fn build(
    records: impl IntoIterator<Item = RawRecord>,
    params: Option<&[String]>,
    cfg: &PipelineConfig,
) -> Result<Modu> {
    let nodes = ingest_records(records, cfg)?;
    let nodes = prune_nodes(nodes, cfg)?;
    let nodes = collapse_modules(nodes, cfg);
    build_modu(nodes, params, cfg)
}
