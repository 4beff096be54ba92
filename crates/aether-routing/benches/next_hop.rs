//! Routing performance benchmarks
//!
//! Next-hop selection runs once per bundle per contact opportunity, so its
//! cost over realistic neighbor-set sizes matters for busy relays.
//!
//! Run with: cargo bench -p aether-routing

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use std::collections::HashMap;

use aether_core::{Bundle, Neighbor, NodeId, Router};
use aether_routing::{ContactGraphRouter, EnergyAwareRouter, StaticRouter};
use rand::Rng;

fn neighbor_set(count: usize) -> HashMap<NodeId, Neighbor> {
    let mut rng = rand::rng();
    (0..count)
        .map(|i| {
            let id = format!("relay-{i}");
            let neighbor = Neighbor::new(id.as_str(), format!("dtn://relay/{i}").as_str())
                .with_link_quality(rng.random_range(0.1..1.0))
                .with_battery(rng.random_range(5.0..100.0));
            (NodeId::from(id.as_str()), neighbor)
        })
        .collect()
}

fn bench_contact_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("contact_graph_select");
    for size in [4usize, 32, 256] {
        let router = ContactGraphRouter::new();
        let neighbors = neighbor_set(size);
        let bundle = Bundle::new("dtn://mars/sat-1", "dtn://earth/gs-nyc", vec![0u8; 256]);

        group.bench_function(format!("{size}_neighbors"), |b| {
            b.iter(|| {
                let _ = black_box(router.select_next_hop(&bundle, black_box(&neighbors)));
            })
        });
    }
    group.finish();
}

fn bench_energy_aware(c: &mut Criterion) {
    let mut group = c.benchmark_group("energy_aware_select");
    for size in [4usize, 32, 256] {
        let router = EnergyAwareRouter::new();
        let neighbors = neighbor_set(size);
        let bundle = Bundle::new("dtn://mars/sat-1", "dtn://earth/gs-nyc", vec![0u8; 256]);

        group.bench_function(format!("{size}_neighbors"), |b| {
            b.iter(|| {
                let _ = black_box(router.select_next_hop(&bundle, black_box(&neighbors)));
            })
        });
    }
    group.finish();
}

fn bench_static(c: &mut Criterion) {
    let router = StaticRouter::new();
    router.add_route("dtn://earth/gs-nyc", "relay-0");
    let neighbors = neighbor_set(32);
    let bundle = Bundle::new("dtn://mars/sat-1", "dtn://earth/gs-nyc", vec![0u8; 256]);

    c.bench_function("static_select_32_neighbors", |b| {
        b.iter(|| {
            let _ = black_box(router.select_next_hop(&bundle, black_box(&neighbors)));
        })
    });
}

criterion_group!(benches, bench_contact_graph, bench_energy_aware, bench_static);
criterion_main!(benches);
