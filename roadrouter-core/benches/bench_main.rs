// Search benchmarks on a synthetic grid network
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use roadrouter_core::build_graph;
use roadrouter_core::model::{Coordinate, NodeType, OptimizationCriteria, RoadEdge, RoadGraph, RoadNode};
use roadrouter_core::routing::{EdgeWeighting, shortest_path};

/// `side` x `side` grid, 0.01 degree spacing, roads both ways between neighbours
fn grid(side: usize) -> RoadGraph {
    let id = |row: usize, col: usize| format!("{row}-{col}");
    let mut nodes = Vec::with_capacity(side * side);
    let mut edges = Vec::with_capacity(side * side * 4);

    for row in 0..side {
        for col in 0..side {
            #[allow(clippy::cast_precision_loss)]
            let coordinate = Coordinate::new(row as f64 * 0.01, col as f64 * 0.01);
            nodes.push(RoadNode::new(id(row, col), coordinate, NodeType::Intersection));

            let mut link = |to: String, minutes: f64| {
                let forward = RoadEdge::new(format!("{}>{to}", id(row, col)), id(row, col), to.clone(), 1.1, minutes)
                    .with_traffic(1.0 + ((row + col) % 3) as f64 * 0.1);
                edges.push(forward.reversed(format!("{to}>{}", id(row, col))));
                edges.push(forward);
            };
            if col + 1 < side {
                link(id(row, col + 1), 1.5);
            }
            if row + 1 < side {
                link(id(row + 1, col), 2.0);
            }
        }
    }

    build_graph(nodes, edges).unwrap()
}

fn benchmark_shortest_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("shortest_path");

    for side in [10, 50, 100] {
        let graph = grid(side);
        let start = graph.index_of("0-0").unwrap();
        let target = graph.index_of(&format!("{}-{}", side - 1, side - 1)).unwrap();

        for criteria in [OptimizationCriteria::Distance, OptimizationCriteria::TrafficAvoidance] {
            let weighting = EdgeWeighting::new(criteria);
            group.bench_with_input(
                BenchmarkId::new(criteria.as_str(), side * side),
                &side,
                |b, _| b.iter(|| shortest_path(black_box(&graph), start, target, &weighting)),
            );
        }
    }

    group.finish();
}

fn benchmark_nearest_node(c: &mut Criterion) {
    let graph = grid(100);
    let probe = Coordinate::new(0.503, 0.497);

    c.bench_function("nearest_node_10k", |b| b.iter(|| graph.nearest_node(black_box(&probe))));
    c.bench_function("nodes_within_radius_10k", |b| {
        b.iter(|| graph.nodes_within_radius(black_box(&probe), 5.0))
    });
}

criterion_group!(benches, benchmark_shortest_path, benchmark_nearest_node);
criterion_main!(benches);
