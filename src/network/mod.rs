//! Network tables and topology queries.

/// Adjacency structure and island partitioning.
pub mod graph;
/// Authoritative tabular records.
pub mod model;

pub use graph::{Island, NetworkGraph};
pub use model::{BranchRecord, BusKind, BusRecord, GenRecord, NetworkModel};
