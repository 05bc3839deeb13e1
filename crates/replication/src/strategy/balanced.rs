//! Balanced-load assignment strategy.
//!
//! Places a segment's replicas on the least-loaded eligible nodes.
//!
//! # Algorithm
//!
//! 1. No candidates: return an empty decision.
//! 2. If the table has no segments anywhere yet, every candidate costs zero
//!    (first segment of a table; there is no load to balance against).
//! 3. Otherwise ask the cost model for every candidate. Candidates it cannot
//!    score (no answer, NaN, negative) are dropped from the pool; an infinite
//!    score is kept as the largest finite cost; if their share reaches the error-rate
//!    threshold the decision is flagged degraded and a warning is logged.
//! 4. Keep the `replica_count` cheapest candidates with a bounded max-heap.
//! 5. Report every selected node and its observed cost back to the model,
//!    which charges the ledger so the next decision sees the new load.
//!
//! All cost reads happen before the first write in step 5, so a decision
//! that is abandoned midway leaves the ledger untouched.

use std::collections::HashSet;
use std::sync::Arc;

use corelib::config::DEFAULT_MAX_ACCEPTABLE_ERROR_RATE;
use corelib::{ClusterState, NodeId, PlacementConfig, TableName};
use tracing::{debug, info, warn};

use crate::cost::{CostModel, CostSample, ZeroCostModel};
use crate::selection::select_lowest;
use crate::strategy::{AssignmentStrategy, PlacementDecision};

/// Balanced-load strategy: `replica_count` least-loaded nodes.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use corelib::{NodeCostLedger, NodeId, StaticClusterState, TableName};
/// use replication::{BalancedLoadStrategy, TrainedCostModel};
///
/// let ledger = Arc::new(NodeCostLedger::new());
/// let model = TrainedCostModel::from_rows(Vec::new(), Arc::clone(&ledger));
/// let cluster = Arc::new(StaticClusterState::new());
/// let strategy = BalancedLoadStrategy::new(Arc::new(model), cluster);
///
/// let candidates = vec![NodeId::from("a"), NodeId::from("b")];
/// let decision = strategy.select_replicas(&candidates, &TableName::from("t1"), 1);
/// assert_eq!(decision.selected.len(), 1);
/// ```
pub struct BalancedLoadStrategy {
    model: Arc<dyn CostModel>,
    cluster: Arc<dyn ClusterState>,
    bootstrap_model: ZeroCostModel,
    max_acceptable_error_rate: f64,
}

impl BalancedLoadStrategy {
    pub fn new(model: Arc<dyn CostModel>, cluster: Arc<dyn ClusterState>) -> Self {
        Self {
            model,
            cluster,
            bootstrap_model: ZeroCostModel,
            max_acceptable_error_rate: DEFAULT_MAX_ACCEPTABLE_ERROR_RATE,
        }
    }

    /// Build with the thresholds from `config`.
    pub fn with_config(
        model: Arc<dyn CostModel>,
        cluster: Arc<dyn ClusterState>,
        config: &PlacementConfig,
    ) -> Self {
        Self::new(model, cluster).with_max_error_rate(config.max_acceptable_error_rate)
    }

    /// Set the degraded threshold. Values outside `[0, 1]` are clamped; NaN
    /// keeps the default.
    pub fn with_max_error_rate(mut self, rate: f64) -> Self {
        self.max_acceptable_error_rate = if rate.is_nan() {
            warn!(rate, "ignoring NaN error-rate threshold");
            DEFAULT_MAX_ACCEPTABLE_ERROR_RATE
        } else {
            rate.clamp(0.0, 1.0)
        };
        self
    }

    /// Choose up to `replica_count` of the least-loaded `candidates`.
    ///
    /// Duplicate candidates are considered once.
    pub fn select_replicas(
        &self,
        candidates: &[NodeId],
        table: &TableName,
        replica_count: usize,
    ) -> PlacementDecision {
        metrics::counter!("placement_decisions_total").increment(1);

        let mut seen = HashSet::with_capacity(candidates.len());
        let candidates: Vec<&NodeId> = candidates.iter().filter(|n| seen.insert(*n)).collect();

        if candidates.is_empty() {
            info!(table = %table, "there is no instance to assign segments for");
            if replica_count > 0 {
                metrics::counter!("placement_short_total").increment(1);
            }
            return PlacementDecision::empty(table, replica_count);
        }

        let bootstrap = !self.cluster.table_has_segments(table);
        let model: &dyn CostModel = if bootstrap {
            &self.bootstrap_model
        } else {
            self.model.as_ref()
        };

        let mut samples = Vec::with_capacity(candidates.len());
        let mut unavailable = Vec::new();
        for node in &candidates {
            match model.score(node, table) {
                Some(cost) if cost >= 0.0 => {
                    // +inf ranks as the most expensive finite cost
                    let cost = cost.min(f64::MAX);
                    debug!(node = %node, table = %table, cost, "scored candidate");
                    samples.push(CostSample::new((*node).clone(), cost));
                }
                Some(cost) => {
                    warn!(node = %node, table = %table, cost, model = model.name(), "discarding invalid cost");
                    unavailable.push((*node).clone());
                }
                None => {
                    debug!(node = %node, table = %table, "candidate cost unavailable");
                    unavailable.push((*node).clone());
                }
            }
        }

        let error_rate = unavailable.len() as f64 / candidates.len() as f64;
        let degraded = !unavailable.is_empty() && error_rate >= self.max_acceptable_error_rate;
        if !unavailable.is_empty() {
            metrics::counter!("placement_unavailable_nodes_total").increment(unavailable.len() as u64);
        }
        if degraded {
            metrics::counter!("placement_degraded_total").increment(1);
            warn!(
                table = %table,
                unavailable = unavailable.len(),
                candidates = candidates.len(),
                error_rate,
                threshold = self.max_acceptable_error_rate,
                "too many candidates failed to report load"
            );
        }

        let selected = select_lowest(samples, replica_count);

        let chosen: Vec<&str> = selected.iter().map(|s| s.node.as_str()).collect();
        info!(
            table = %table,
            model = model.name(),
            bootstrap,
            requested = replica_count,
            selected = ?chosen,
            "segment assignment result"
        );

        for sample in &selected {
            model.record_assignment(&sample.node, table, sample.cost);
        }

        let decision = PlacementDecision {
            table: table.clone(),
            requested: replica_count,
            candidates: candidates.len(),
            selected,
            unavailable,
            degraded,
            bootstrap,
        };
        if decision.is_short() {
            metrics::counter!("placement_short_total").increment(1);
        }
        decision
    }
}

impl AssignmentStrategy for BalancedLoadStrategy {
    fn assign_replicas(
        &self,
        candidates: &[NodeId],
        table: &TableName,
        replica_count: usize,
    ) -> PlacementDecision {
        self.select_replicas(candidates, table, replica_count)
    }

    fn name(&self) -> &'static str {
        "BalancedLoadStrategy"
    }
}
