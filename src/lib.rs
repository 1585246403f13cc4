//! visumod: turns a flat traced computation graph into a navigable module
//! tree for progressive exploration.
//!
//! The pipeline runs in fixed order, each stage consuming the previous
//! stage's full node mapping:
//!
//! ingest -> prune -> collapse -> build (module tree) -> export (per module)
//!
//! Stages 1-4 run once per graph snapshot; the resulting [`modu::Modu`] is
//! immutable and may be shared read-only across concurrent exports.

pub mod collapse;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod modu;
pub mod pipeline;
pub mod prune;

pub type Result<T> = anyhow::Result<T>;
