// benches/bench_road_lookup.rs

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use roadnet_rts::model::topology::{inbound_roads, road_between, NodeId};

fn bench_road_lookup(c: &mut Criterion) {
    c.bench_function("road_between_hit", |b| {
        b.iter(|| road_between(black_box(NodeId::E3), black_box(NodeId::Cr3)))
    });
    c.bench_function("road_between_miss", |b| {
        b.iter(|| road_between(black_box(NodeId::S), black_box(NodeId::E1)))
    });
    c.bench_function("inbound_roads_cr3", |b| {
        b.iter(|| inbound_roads(black_box(NodeId::Cr3)))
    });
}

criterion_group!(benches, bench_road_lookup);
criterion_main!(benches);
