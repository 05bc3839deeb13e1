use std::sync::Arc;

use corelib::{NodeCostLedger, NodeId, StaticClusterState, TableName};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use replication::{select_lowest, BalancedLoadStrategy, CostSample, TrainedCostModel};

fn samples(n: usize) -> Vec<CostSample> {
    (0..n)
        .map(|i| CostSample::new(NodeId::from(format!("node-{}", i)), ((i * 7919) % 1000) as f64))
        .collect()
}

fn bench_select_lowest(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_lowest");
    for n in [16usize, 256, 4096] {
        let data = samples(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("k3", n), &data, |b, data| {
            b.iter(|| select_lowest(black_box(data.clone()), 3))
        });
    }
    group.finish();
}

fn bench_balanced_decision(c: &mut Criterion) {
    let table = TableName::from("events_OFFLINE");
    let ledger = Arc::new(NodeCostLedger::new());
    let model = TrainedCostModel::from_rows(vec![(table.clone(), 1.0)], Arc::clone(&ledger));
    let cluster = StaticClusterState::new();
    cluster.add_segment(&table);
    let strategy = BalancedLoadStrategy::new(Arc::new(model), Arc::new(cluster));
    let candidates: Vec<NodeId> = (0..64).map(|i| NodeId::from(format!("node-{}", i))).collect();

    c.bench_function("balanced-64-nodes-k3", |b| {
        b.iter(|| strategy.select_replicas(black_box(&candidates), &table, 3))
    });
}

criterion_group!(benches, bench_select_lowest, bench_balanced_decision);
criterion_main!(benches);
