//! Cost models.
//!
//! A cost model estimates how loaded a node would be if it took a new
//! segment of a given table. Placement picks the nodes with the lowest
//! estimates. Available models:
//!
//! - **ZeroCostModel**: every node costs nothing (first segment of a table)
//! - **TrainedCostModel**: ledger cost plus a per-table baseline learned from
//!   historical samples
//! - **ProbedCostModel**: whatever the nodes themselves last reported; nodes
//!   that failed to report are unavailable

pub mod probed;
pub mod trained;
pub mod zero;

pub use probed::{LoadProbe, ProbedCostModel};
pub use trained::TrainedCostModel;
pub use zero::ZeroCostModel;

use corelib::{NodeId, TableName};
use serde::Serialize;

/// A node together with the cost observed for it in one decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostSample {
    pub node: NodeId,
    pub cost: f64,
}

impl CostSample {
    pub fn new(node: NodeId, cost: f64) -> Self {
        Self { node, cost }
    }
}

/// Trait for node cost estimation.
///
/// # Thread Safety
///
/// Models are shared across concurrent placement decisions and must be
/// `Send + Sync`.
pub trait CostModel: Send + Sync {
    /// Estimated load of `node` after taking a segment of `table`.
    ///
    /// `None` means the node's cost could not be determined. Callers must not
    /// read that as zero cost.
    fn score(&self, node: &NodeId, table: &TableName) -> Option<f64>;

    /// Called once for every node a decision selected, with the cost that
    /// decision observed for it. Models that keep no state ignore it.
    fn record_assignment(&self, _node: &NodeId, _table: &TableName, _cost: f64) {}

    /// Model name (for logging/debugging).
    fn name(&self) -> &'static str;
}
