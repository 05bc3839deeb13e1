//! Load-aware replica placement.
//!
//! This crate decides which nodes should host the replicas of a new segment:
//! - Cost models estimate each candidate node's load
//! - Bounded top-K selection keeps the least-loaded candidates
//! - Assignment strategies tie the two together and feed chosen nodes back
//!   into the shared ledger

pub mod cost;
pub mod error;
pub mod selection;
pub mod strategy;

pub use cost::{CostModel, CostSample, LoadProbe, ProbedCostModel, TrainedCostModel, ZeroCostModel};
pub use error::ReplicationError;
pub use selection::{select_lowest, BoundedMaxHeap};
pub use strategy::{AssignmentStrategy, BalancedLoadStrategy, PlacementDecision};
