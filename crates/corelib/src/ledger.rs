//! Per-node cumulative cost ledger.
//!
//! The ledger remembers how much expected load has been routed to each node
//! by earlier placement decisions, so that the next decision can steer away
//! from nodes that were just chosen. It is the only mutable state shared
//! between concurrent placement decisions and the observability side.
//!
//! # Semantics
//!
//! - A node that has never been charged reads as cost `0`.
//! - [`NodeCostLedger::add_cost`] is a per-node atomic read-modify-write:
//!   `new = old + delta`. Two decisions charging the same node concurrently
//!   never lose an update.
//! - Stored costs saturate at `f64::MAX`; a node charged without bound
//!   stays the most expensive candidate instead of overflowing to infinity.
//! - There is no transaction across nodes; charging N nodes is N independent
//!   increments.
//!
//! # Decay
//!
//! By default the ledger is purely additive and only ever grows. A ledger
//! built with [`NodeCostLedger::with_half_life`] instead ages stored costs:
//! a value recorded `t` ago reads as `value * 0.5^(t / half_life)`, and an
//! addition first ages the stored value, then adds. This keeps the ledger
//! tracking recent load instead of all-time load.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::node::NodeId;

#[derive(Debug, Clone, Copy)]
struct LedgerEntry {
    cost: f64,
    updated_at: Instant,
}

/// Shared map of node → cumulative placement cost.
///
/// Share it between placement strategies and reporters with `Arc`.
#[derive(Debug, Default)]
pub struct NodeCostLedger {
    entries: DashMap<NodeId, LedgerEntry>,
    half_life: Option<Duration>,
}

impl NodeCostLedger {
    /// Create a purely additive ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger whose entries halve every `half_life`.
    ///
    /// A zero half-life is treated as "no decay".
    pub fn with_half_life(half_life: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            half_life: (!half_life.is_zero()).then_some(half_life),
        }
    }

    pub fn half_life(&self) -> Option<Duration> {
        self.half_life
    }

    /// Current cost for `node`; `0` for nodes never charged.
    pub fn get(&self, node: &NodeId) -> f64 {
        self.get_at(node, Instant::now())
    }

    /// Like [`NodeCostLedger::get`], evaluated at `now`.
    pub fn get_at(&self, node: &NodeId, now: Instant) -> f64 {
        self.entries
            .get(node)
            .map(|entry| self.aged(&entry, now))
            .unwrap_or(0.0)
    }

    /// Add `delta` to `node`'s cost and return the new value.
    ///
    /// Negative or non-finite deltas are ignored. The stored value saturates
    /// at `f64::MAX`.
    pub fn add_cost(&self, node: &NodeId, delta: f64) -> f64 {
        self.add_cost_at(node, delta, Instant::now())
    }

    /// Like [`NodeCostLedger::add_cost`], evaluated at `now`.
    pub fn add_cost_at(&self, node: &NodeId, delta: f64, now: Instant) -> f64 {
        if !delta.is_finite() || delta < 0.0 {
            warn!(node = %node, delta, "ignoring invalid ledger delta");
            return self.get_at(node, now);
        }

        let mut entry = self.entries.entry(node.clone()).or_insert(LedgerEntry {
            cost: 0.0,
            updated_at: now,
        });
        let updated = (self.aged(&entry, now) + delta).min(f64::MAX);
        entry.cost = updated;
        entry.updated_at = now;
        drop(entry);

        debug!(node = %node, delta, cost = updated, "ledger charged");
        metrics::gauge!("ledger_node_cost", "node" => node.to_string()).set(updated);
        updated
    }

    /// Drop a node's entry, returning its last value.
    ///
    /// Placement never calls this; it exists for topology owners that retire
    /// nodes from the cluster.
    pub fn remove(&self, node: &NodeId) -> Option<f64> {
        let now = Instant::now();
        self.entries
            .remove(node)
            .map(|(_, entry)| self.aged(&entry, now))
    }

    /// Visit every `(node, cost)` pair. Iteration order is unspecified.
    ///
    /// The callback runs while a shard read lock is held; it must not write
    /// to this ledger.
    pub fn for_each(&self, mut f: impl FnMut(&NodeId, f64)) {
        let now = Instant::now();
        for item in self.entries.iter() {
            f(item.key(), self.aged(item.value(), now));
        }
    }

    /// Copy of all entries, sorted by node.
    pub fn snapshot(&self) -> Vec<LedgerSnapshotEntry> {
        let mut out = Vec::with_capacity(self.entries.len());
        self.for_each(|node, cost| {
            out.push(LedgerSnapshotEntry {
                node: node.clone(),
                cost,
            })
        });
        out.sort_by(|a, b| a.node.cmp(&b.node));
        out
    }

    /// Sum of all node costs, saturating at `f64::MAX`.
    pub fn total(&self) -> f64 {
        let mut total = 0.0_f64;
        self.for_each(|_, cost| total = (total + cost).min(f64::MAX));
        total
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn aged(&self, entry: &LedgerEntry, now: Instant) -> f64 {
        match self.half_life {
            None => entry.cost,
            Some(half_life) => {
                let elapsed = now.saturating_duration_since(entry.updated_at);
                entry.cost * 0.5_f64.powf(elapsed.as_secs_f64() / half_life.as_secs_f64())
            }
        }
    }
}

/// One row of a ledger snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSnapshotEntry {
    pub node: NodeId,
    pub cost: f64,
}
