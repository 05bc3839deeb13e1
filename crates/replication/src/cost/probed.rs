//! Cost model backed by loads reported by the nodes themselves.
//!
//! Probing a node is a remote call that may hang or fail, so it happens
//! outside the placement path: [`ProbedCostModel::refresh`] asks every
//! candidate concurrently, each call bounded by a timeout, and caches the
//! answers. Scoring then reads the cache. A node whose last probe failed or
//! timed out has no cached answer and scores as unavailable.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use corelib::{NodeId, PlacementConfig, TableName};
use parking_lot::RwLock;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::cost::CostModel;
use crate::error::{ReplicationError, Result};

/// Source of node-reported load, typically an RPC client.
#[async_trait]
pub trait LoadProbe: Send + Sync + 'static {
    /// Load `node` currently reports for `table`.
    async fn report_load(&self, node: &NodeId, table: &TableName) -> Result<f64>;
}

pub struct ProbedCostModel {
    probe: Arc<dyn LoadProbe>,
    timeout: Duration,
    reports: RwLock<HashMap<TableName, HashMap<NodeId, f64>>>,
}

impl ProbedCostModel {
    pub fn new(probe: Arc<dyn LoadProbe>, timeout: Duration) -> Self {
        Self {
            probe,
            timeout,
            reports: RwLock::new(HashMap::new()),
        }
    }

    /// Build with the per-probe timeout from `config`.
    pub fn with_config(probe: Arc<dyn LoadProbe>, config: &PlacementConfig) -> Self {
        Self::new(probe, config.probe_timeout())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probe every candidate for `table` and replace their cached loads.
    ///
    /// Returns how many candidates answered. Candidates that failed lose any
    /// previously cached load.
    pub async fn refresh(&self, candidates: &[NodeId], table: &TableName) -> usize {
        let mut probes = JoinSet::new();
        for node in candidates {
            let probe = Arc::clone(&self.probe);
            let node = node.clone();
            let table = table.clone();
            let timeout = self.timeout;
            probes.spawn(async move {
                let outcome = match tokio::time::timeout(timeout, probe.report_load(&node, &table)).await {
                    Ok(result) => result,
                    Err(_) => Err(ReplicationError::ProbeTimeout {
                        node: node.clone(),
                        timeout,
                    }),
                };
                (node, outcome)
            });
        }

        let mut answered = HashMap::new();
        let mut failed = Vec::new();
        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok((node, Ok(load))) if load.is_finite() && load >= 0.0 => {
                    debug!(node = %node, table = %table, load, "probe answered");
                    answered.insert(node, load);
                }
                Ok((node, Ok(load))) => {
                    warn!(node = %node, table = %table, load, "probe returned invalid load");
                    failed.push(node);
                }
                Ok((node, Err(e))) => {
                    warn!(node = %node, table = %table, error = %e, "probe failed");
                    failed.push(node);
                }
                Err(e) => warn!(error = %e, "probe task aborted"),
            }
        }

        let count = answered.len();
        let mut reports = self.reports.write();
        let cached = reports.entry(table.clone()).or_default();
        for node in &failed {
            cached.remove(node);
        }
        cached.extend(answered);
        count
    }

    /// Drop every cached load for `table`.
    pub fn invalidate(&self, table: &TableName) {
        self.reports.write().remove(table);
    }
}

impl CostModel for ProbedCostModel {
    fn score(&self, node: &NodeId, table: &TableName) -> Option<f64> {
        self.reports.read().get(table)?.get(node).copied()
    }

    fn name(&self) -> &'static str {
        "ProbedCostModel"
    }
}
