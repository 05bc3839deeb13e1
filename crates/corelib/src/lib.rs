//! Core library for load-aware segment placement.
//!
//! This crate provides the building blocks shared by placement strategies
//! and observability:
//! - Node and table identifiers
//! - The segment cost decay curve and per-table decay models
//! - The shared per-node cost ledger
//! - The cluster-state seam placement queries
//! - Server and ledger load reports
//! - Placement configuration

pub mod config;
pub mod decay;
pub mod error;
pub mod ledger;
pub mod node;
pub mod report;
pub mod table;
pub mod topology;

pub use config::PlacementConfig;
pub use decay::{decay_cost, DecayModelTable, DecayParameters, SegmentWindow};
pub use error::{Error, Result};
pub use ledger::{LedgerSnapshotEntry, NodeCostLedger};
pub use node::NodeId;
pub use report::{compute_server_load, HostedSegment, LedgerReport, ServerLoadReport};
pub use table::{TableName, TableType};
pub use topology::{ClusterState, StaticClusterState};
