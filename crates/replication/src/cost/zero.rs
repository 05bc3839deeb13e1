//! Zero-cost model.
//!
//! Used when a table has no segments anywhere yet: there is nothing to learn
//! from, so every candidate is equally good and nothing is recorded.

use corelib::{NodeId, TableName};

use crate::cost::CostModel;

#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroCostModel;

impl CostModel for ZeroCostModel {
    fn score(&self, _node: &NodeId, _table: &TableName) -> Option<f64> {
        Some(0.0)
    }

    fn name(&self) -> &'static str {
        "ZeroCostModel"
    }
}
