//! Segment assignment strategy abstractions.
//!
//! An assignment strategy decides which of the eligible nodes should host
//! the replicas of a new segment.
//!
//! - **BalancedLoadStrategy**: the `replica_count` least-loaded nodes
//!   according to a [`CostModel`](crate::cost::CostModel)

pub mod balanced;

pub use balanced::BalancedLoadStrategy;

use corelib::{NodeId, TableName};
use serde::Serialize;

use crate::cost::CostSample;

/// Trait for segment assignment strategies.
///
/// # Thread Safety
///
/// Implementations must be thread-safe (Send + Sync) as one strategy instance
/// serves concurrent placement decisions.
pub trait AssignmentStrategy: Send + Sync {
    /// Choose up to `replica_count` nodes out of `candidates` for a new
    /// segment of `table`.
    ///
    /// Never fails: an unusable cluster shows up as a short decision.
    fn assign_replicas(
        &self,
        candidates: &[NodeId],
        table: &TableName,
        replica_count: usize,
    ) -> PlacementDecision;

    /// Get the strategy name (for logging/debugging).
    fn name(&self) -> &'static str;
}

/// Outcome of one placement decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacementDecision {
    pub table: TableName,
    /// Replica count the caller asked for.
    pub requested: usize,
    /// Distinct candidates considered.
    pub candidates: usize,
    /// Chosen nodes with the cost observed for each, cheapest first.
    pub selected: Vec<CostSample>,
    /// Candidates whose cost could not be determined.
    pub unavailable: Vec<NodeId>,
    /// True when the unavailable share reached the configured threshold.
    pub degraded: bool,
    /// True when the table had no segments and every candidate scored zero.
    pub bootstrap: bool,
}

impl PlacementDecision {
    pub(crate) fn empty(table: &TableName, requested: usize) -> Self {
        Self {
            table: table.clone(),
            requested,
            candidates: 0,
            selected: Vec::new(),
            unavailable: Vec::new(),
            degraded: false,
            bootstrap: false,
        }
    }

    /// Selected nodes, cheapest first.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.selected.iter().map(|s| s.node.clone()).collect()
    }

    pub fn into_nodes(self) -> Vec<NodeId> {
        self.selected.into_iter().map(|s| s.node).collect()
    }

    /// True when fewer nodes were selected than requested.
    pub fn is_short(&self) -> bool {
        self.selected.len() < self.requested
    }

    /// Unavailable candidates over all candidates; `0` with no candidates.
    pub fn error_rate(&self) -> f64 {
        if self.candidates == 0 {
            return 0.0;
        }
        self.unavailable.len() as f64 / self.candidates as f64
    }
}
