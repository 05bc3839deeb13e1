//! Trained cost model.
//!
//! Combines two sources:
//!
//! 1. A per-table baseline cost, summed from historical training samples
//!    once at construction.
//! 2. The shared [`NodeCostLedger`], charged every time placement selects a
//!    node.
//!
//! A node's score for a table is `ledger[node] + baseline[table]`, each
//! defaulting to zero. The model never reports a node as unavailable.
//!
//! # Training data
//!
//! One sample per line, `table,<ignored>,cost`. Samples for the same table
//! are summed. Lines that do not parse are skipped with a warning.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use corelib::{NodeCostLedger, NodeId, TableName};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info, warn};

use crate::cost::CostModel;
use crate::error::Result;

#[derive(Debug)]
pub struct TrainedCostModel {
    table_costs: HashMap<TableName, f64>,
    ledger: Arc<NodeCostLedger>,
}

impl TrainedCostModel {
    /// Build from already-parsed `(table, cost)` samples.
    pub fn from_rows(
        rows: impl IntoIterator<Item = (TableName, f64)>,
        ledger: Arc<NodeCostLedger>,
    ) -> Self {
        let mut table_costs: HashMap<TableName, f64> = HashMap::new();
        for (table, cost) in rows {
            *table_costs.entry(table).or_insert(0.0) += cost;
        }
        Self { table_costs, ledger }
    }

    /// Parse training samples from `reader`, skipping malformed lines.
    pub fn from_reader(reader: impl Read, ledger: Arc<NodeCostLedger>) -> Self {
        let mut samples = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for record in samples.records() {
            let record = match record {
                Ok(record) => record,
                Err(e) if e.is_io_error() => {
                    warn!(error = %e, "stopping training data read");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "skipping unreadable training record");
                    continue;
                }
            };
            match parse_training_record(&record) {
                Some(row) => rows.push(row),
                None => warn!(
                    line = ?record.position().map(|p| p.line()),
                    content = ?record,
                    "skipping malformed training row"
                ),
            }
        }

        let model = Self::from_rows(rows, ledger);
        for (table, cost) in &model.table_costs {
            debug!(table = %table, cost, "trained table cost");
        }
        info!(tables = model.table_costs.len(), "loaded training data");
        model
    }

    /// Load training samples from a file.
    pub fn from_path(path: impl AsRef<Path>, ledger: Arc<NodeCostLedger>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(Self::from_reader(file, ledger))
    }

    /// Baseline cost learned for `table`; zero for unknown tables.
    pub fn table_cost(&self, table: &TableName) -> f64 {
        self.table_costs.get(table).copied().unwrap_or(0.0)
    }

    pub fn ledger(&self) -> &Arc<NodeCostLedger> {
        &self.ledger
    }
}

fn parse_training_record(record: &StringRecord) -> Option<(TableName, f64)> {
    let table = TableName::new(record.get(0)?).ok()?;
    let _ignored = record.get(1)?;
    let cost = record.get(2)?.parse::<f64>().ok()?;
    if !cost.is_finite() || cost < 0.0 {
        return None;
    }
    Some((table, cost))
}

impl CostModel for TrainedCostModel {
    fn score(&self, node: &NodeId, table: &TableName) -> Option<f64> {
        Some(self.ledger.get(node) + self.table_cost(table))
    }

    fn record_assignment(&self, node: &NodeId, table: &TableName, cost: f64) {
        debug!(node = %node, table = %table, cost, "recording assignment cost");
        self.ledger.add_cost(node, cost);
    }

    fn name(&self) -> &'static str {
        "TrainedCostModel"
    }
}
