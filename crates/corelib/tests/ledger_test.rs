//! Tests for the shared node cost ledger.
//!
//! # Test Strategy
//!
//! 1. **Basic functionality**: default reads, cumulative adds
//! 2. **Observability**: for_each, snapshot, report
//! 3. **Thread safety**: concurrent increments on shared and distinct nodes

use std::sync::Arc;

use corelib::ledger::NodeCostLedger;
use corelib::node::NodeId;
use corelib::report::LedgerReport;

// ============================================================================
// Basic Functionality Tests
// ============================================================================

#[test]
fn test_new_ledger_is_empty() {
    let ledger = NodeCostLedger::new();
    assert!(ledger.is_empty());
    assert_eq!(ledger.total(), 0.0);
    assert_eq!(ledger.get(&NodeId::from("missing")), 0.0);
}

#[test]
fn test_add_increases_by_exactly_delta() {
    let ledger = NodeCostLedger::new();
    let node = NodeId::from("Server_1");

    for delta in [3.0, 7.0, 0.0, 12.5] {
        let before = ledger.get(&node);
        ledger.add_cost(&node, delta);
        assert_eq!(ledger.get(&node), before + delta);
    }
}

// ============================================================================
// Observability Tests
// ============================================================================

#[test]
fn test_for_each_visits_every_node() {
    let ledger = NodeCostLedger::new();
    ledger.add_cost(&NodeId::from("a"), 1.0);
    ledger.add_cost(&NodeId::from("b"), 2.0);
    ledger.add_cost(&NodeId::from("a"), 1.0);

    let mut seen = Vec::new();
    ledger.for_each(|node, cost| seen.push((node.to_string(), cost)));
    seen.sort_by(|x, y| x.0.cmp(&y.0));

    assert_eq!(seen, vec![("a".to_string(), 2.0), ("b".to_string(), 2.0)]);
}

#[test]
fn test_report_serializes() {
    let ledger = NodeCostLedger::new();
    ledger.add_cost(&NodeId::from("a"), 1.0);

    let report = LedgerReport::capture(&ledger);
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["total_cost"], 1.0);
    assert_eq!(json["nodes"][0]["node"], "a");
}

// ============================================================================
// Thread Safety Tests
// ============================================================================

#[test]
fn test_concurrent_adds_on_same_node_are_not_lost() {
    let ledger = Arc::new(NodeCostLedger::new());
    let node = NodeId::from("hot");

    crossbeam::scope(|s| {
        for _ in 0..8 {
            let ledger = Arc::clone(&ledger);
            let node = node.clone();
            s.spawn(move |_| {
                for _ in 0..1_000 {
                    ledger.add_cost(&node, 1.0);
                }
            });
        }
    })
    .unwrap();

    assert_eq!(ledger.get(&node), 8_000.0);
}

#[test]
fn test_concurrent_adds_on_distinct_nodes() {
    let ledger = NodeCostLedger::new();

    crossbeam::scope(|s| {
        for worker in 0..4 {
            let ledger = &ledger;
            s.spawn(move |_| {
                for i in 0..50 {
                    let node = NodeId::from(format!("node-{}", i % 10));
                    ledger.add_cost(&node, (worker + 1) as f64);
                }
            });
        }
    })
    .unwrap();

    assert_eq!(ledger.len(), 10);
    // each worker charges each node 5 times: 5 * (1 + 2 + 3 + 4)
    for i in 0..10 {
        assert_eq!(ledger.get(&NodeId::from(format!("node-{}", i))), 50.0);
    }
    assert_eq!(ledger.total(), 500.0);
}
