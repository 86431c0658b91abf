//! Single-pair shortest path search over the road graph

mod state;

use std::collections::BinaryHeap;

use fixedbitset::FixedBitSet;
use hashbrown::HashMap;
use hashbrown::hash_map::Entry;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use self::state::State;
use super::criteria::EdgeWeighting;
use crate::model::RoadGraph;

/// Path found by [`shortest_path`].
///
/// `cost` is the search cost under the weighting used; the totals are raw
/// sums over the traversed edges.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortestPath {
    pub nodes: Vec<NodeIndex>,
    pub edges: Vec<EdgeIndex>,
    pub cost: f64,
    pub total_distance: f64,
    pub total_time: f64,
    pub total_toll: f64,
    /// Nodes settled by the search
    pub nodes_evaluated: usize,
}

impl ShortestPath {
    fn trivial(node: NodeIndex) -> Self {
        Self {
            nodes: vec![node],
            edges: Vec::new(),
            cost: 0.0,
            total_distance: 0.0,
            total_time: 0.0,
            total_toll: 0.0,
            nodes_evaluated: 1,
        }
    }

    /// Appends a path starting where this one ends
    pub fn join(&mut self, next: ShortestPath) {
        debug_assert_eq!(self.nodes.last(), next.nodes.first());
        self.nodes.extend(next.nodes.into_iter().skip(1));
        self.edges.extend(next.edges);
        self.cost += next.cost;
        self.total_distance += next.total_distance;
        self.total_time += next.total_time;
        self.total_toll += next.total_toll;
        self.nodes_evaluated += next.nodes_evaluated;
    }
}

/// Dijkstra's algorithm from `start` to `target`.
///
/// Stops as soon as `target` is settled. Returns `None` when `target` is not
/// reachable through the edges `weighting` allows.
pub fn shortest_path(
    graph: &RoadGraph,
    start: NodeIndex,
    target: NodeIndex,
    weighting: &EdgeWeighting,
) -> Option<ShortestPath> {
    if start == target {
        return Some(ShortestPath::trivial(start));
    }

    let estimated_nodes = graph.node_count().min(1000);
    let mut costs: HashMap<NodeIndex, f64> = HashMap::with_capacity(estimated_nodes);
    let mut predecessors: HashMap<NodeIndex, EdgeIndex> = HashMap::with_capacity(estimated_nodes);
    let mut settled = FixedBitSet::with_capacity(graph.node_count());
    let mut heap = BinaryHeap::with_capacity(estimated_nodes / 4);
    let mut nodes_evaluated = 0;

    heap.push(State {
        cost: 0.0,
        node: start,
    });
    costs.insert(start, 0.0);

    while let Some(State { cost, node }) = heap.pop() {
        // Stale heap entry
        if settled.put(node.index()) {
            continue;
        }
        nodes_evaluated += 1;

        if node == target {
            break;
        }

        for edge in graph.edges(node) {
            let next = edge.target();
            if settled.contains(next.index()) {
                continue;
            }
            let Some(edge_cost) = weighting.cost(edge.weight()) else {
                continue;
            };
            let next_cost = cost + edge_cost;

            match costs.entry(next) {
                Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                }
                Entry::Occupied(mut entry) => {
                    if next_cost >= *entry.get() {
                        continue;
                    }
                    *entry.get_mut() = next_cost;
                }
            }
            predecessors.insert(next, edge.id());
            heap.push(State {
                cost: next_cost,
                node: next,
            });
        }
    }

    if !settled.contains(target.index()) {
        return None;
    }

    let mut edges = Vec::new();
    let mut nodes = vec![target];
    let mut current = target;
    while current != start {
        let edge = *predecessors.get(&current)?;
        let (previous, _) = graph.edge_endpoints(edge)?;
        edges.push(edge);
        nodes.push(previous);
        current = previous;
    }
    edges.reverse();
    nodes.reverse();

    let mut path = ShortestPath {
        nodes,
        edges: Vec::with_capacity(edges.len()),
        cost: costs.get(&target).copied()?,
        total_distance: 0.0,
        total_time: 0.0,
        total_toll: 0.0,
        nodes_evaluated,
    };
    for edge in edges {
        let weight = graph.edge(edge);
        path.total_distance += weight.distance();
        path.total_time += weight.travel_time();
        path.total_toll += weight.toll_cost();
        path.edges.push(edge);
    }

    Some(path)
}

/// Routes through `stops` in order, one search per consecutive pair, and
/// joins the legs. `None` if any leg is unreachable or `stops` is empty.
pub fn route_through(
    graph: &RoadGraph,
    stops: &[NodeIndex],
    weighting: &EdgeWeighting,
) -> Option<ShortestPath> {
    let (&first, rest) = stops.split_first()?;
    let mut path = ShortestPath {
        nodes_evaluated: 0,
        ..ShortestPath::trivial(first)
    };
    let mut from = first;
    for &to in rest {
        path.join(shortest_path(graph, from, to, weighting)?);
        from = to;
    }
    Some(path)
}
