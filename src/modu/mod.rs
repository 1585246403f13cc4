//! Module tree layer: the trie built from pruned node paths, plus the
//! per-module metadata exports consumed by layout/rendering collaborators.

pub mod export;
pub mod tree;

pub use export::{ModuleExport, NodeView};
pub use tree::{Modu, ModuleEntry, build_modu};
