//! Load reporting for observability.
//!
//! Two views are provided:
//!
//! - [`compute_server_load`]: what a single server currently carries, by
//!   applying each table's decay curve to every segment it hosts.
//! - [`LedgerReport`]: what the placement ledger believes every node carries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::decay::{decay_cost, DecayModelTable, SegmentWindow};
use crate::ledger::{LedgerSnapshotEntry, NodeCostLedger};
use crate::table::TableName;

/// A segment hosted on a server, as seen by the reporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostedSegment {
    pub table: TableName,
    pub name: String,
    pub total_docs: u64,
    pub start_time: i64,
    pub end_time: i64,
    #[serde(default)]
    pub disk_size_bytes: u64,
    #[serde(default)]
    pub hit_count: u64,
}

impl HostedSegment {
    pub fn window(&self) -> SegmentWindow {
        SegmentWindow::new(self.total_docs, self.start_time, self.end_time)
    }
}

/// Aggregate load of one server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerLoadReport {
    pub segment_count: usize,
    pub segment_disk_size_bytes: u64,
    pub segments_hit_count: u64,
    /// Sum of decayed cost over segments whose table has a decay model.
    pub segment_load: f64,
    /// `(start, end)` of every costed segment, per table.
    pub segment_time_info: BTreeMap<TableName, Vec<(i64, i64)>>,
}

/// Sum the decayed cost of `segments` at `reference_time`.
///
/// Count, disk size and hit totals cover every segment. Segments of tables
/// missing from `models` add no load and no time span.
pub fn compute_server_load(
    segments: &[HostedSegment],
    models: &DecayModelTable,
    reference_time: i64,
) -> ServerLoadReport {
    let mut report = ServerLoadReport::default();

    for segment in segments {
        report.segment_count += 1;
        report.segment_disk_size_bytes = report.segment_disk_size_bytes.saturating_add(segment.disk_size_bytes);
        report.segments_hit_count = report.segments_hit_count.saturating_add(segment.hit_count);

        let Some(params) = models.get(segment.table.as_str()) else {
            debug!(table = %segment.table, segment = %segment.name, "no decay model for table");
            continue;
        };

        report.segment_load += decay_cost(params, &segment.window(), reference_time);
        report
            .segment_time_info
            .entry(segment.table.clone())
            .or_default()
            .push((segment.start_time, segment.end_time));
    }

    info!(
        segments = report.segment_count,
        load = report.segment_load,
        "computed server load"
    );
    report
}

/// Cluster-wide view of the placement ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LedgerReport {
    pub nodes: Vec<LedgerSnapshotEntry>,
    pub total_cost: f64,
}

impl LedgerReport {
    pub fn capture(ledger: &NodeCostLedger) -> Self {
        let nodes = ledger.snapshot();
        let total_cost = nodes.iter().fold(0.0, |total, e| (total + e.cost).min(f64::MAX));
        Self { nodes, total_cost }
    }
}
