//! Flat graph layer: the node data model and ingestion of raw trace records.

pub mod ingest;
pub mod node;

pub use ingest::{RawRecord, ingest_records};
pub use node::{Node, NodeMap, Shape};
