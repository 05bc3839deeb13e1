//! Cluster-state views consumed by placement.
//!
//! Placement only needs to know whether a table already has segments
//! anywhere in the cluster. How that is answered (ideal state, a metadata
//! store, a test fixture) is up to the implementor.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::table::TableName;

/// Read-only view of which tables already hold segments.
///
/// # Thread Safety
///
/// Implementations are shared across concurrent placement decisions and must
/// be `Send + Sync`.
pub trait ClusterState: Send + Sync {
    /// True if `table` has at least one segment assigned anywhere.
    fn table_has_segments(&self, table: &TableName) -> bool;
}

/// In-memory cluster state keyed by table, holding a segment count per table.
#[derive(Debug, Default)]
pub struct StaticClusterState {
    segments: RwLock<HashMap<TableName, usize>>,
}

impl StaticClusterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one more segment for `table`. Returns the new count.
    pub fn add_segment(&self, table: &TableName) -> usize {
        let mut segments = self.segments.write();
        let count = segments.entry(table.clone()).or_insert(0);
        *count += 1;
        *count
    }

    /// Forget a table entirely.
    pub fn remove_table(&self, table: &TableName) -> bool {
        self.segments.write().remove(table).is_some()
    }

    pub fn segment_count(&self, table: &TableName) -> usize {
        self.segments.read().get(table).copied().unwrap_or(0)
    }
}

impl ClusterState for StaticClusterState {
    fn table_has_segments(&self, table: &TableName) -> bool {
        self.segment_count(table) > 0
    }
}
