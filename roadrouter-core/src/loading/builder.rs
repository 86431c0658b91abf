use hashbrown::HashMap;
use log::{debug, info, warn};
use petgraph::graph::DiGraph;
use rstar::RTree;

use crate::model::roads::IndexedPoint;
use crate::model::{GraphEdge, RoadEdge, RoadGraph, RoadNode};
use crate::storage::MapDataSource;
use crate::Error;

/// Builds a road graph from node and edge records
///
/// Inactive records are ignored. Edges referencing a node that is not part
/// of the graph are dropped with a warning.
///
/// # Errors
///
/// Returns an error if two active nodes share an id or a node has coordinates
/// outside the valid latitude/longitude range
pub fn build_graph(nodes: Vec<RoadNode>, edges: Vec<RoadEdge>) -> Result<RoadGraph, Error> {
    let active_nodes = nodes.into_iter().filter(|node| node.is_active);
    let mut graph = DiGraph::with_capacity(0, edges.len());
    let mut node_lookup = HashMap::new();
    let mut points = Vec::new();

    for node in active_nodes {
        if !node.coordinate.is_valid() {
            return Err(Error::InvalidData(format!(
                "Node {} has invalid coordinate {}",
                node.id, node.coordinate
            )));
        }
        if node_lookup.contains_key(&node.id) {
            return Err(Error::InvalidData(format!("Duplicate node id: {}", node.id)));
        }

        let position = [node.coordinate.longitude, node.coordinate.latitude];
        let id = node.id.clone();
        let index = graph.add_node(node);
        node_lookup.insert(id, index);
        points.push(IndexedPoint::new(position, index));
    }

    let mut dangling = 0usize;
    for edge in edges.into_iter().filter(|edge| edge.is_active) {
        let (Some(&from), Some(&to)) = (
            node_lookup.get(&edge.from_node_id),
            node_lookup.get(&edge.to_node_id),
        ) else {
            debug!(
                "Dropping edge {} ({} -> {}): endpoint not in graph",
                edge.id,
                edge.from_node_id,
                edge.to_node_id
            );
            dangling += 1;
            continue;
        };
        graph.add_edge(from, to, GraphEdge::new(edge));
    }

    if dangling > 0 {
        warn!("{dangling} edges reference nodes outside the graph and were skipped");
    }

    info!(
        "Built road graph with {} nodes and {} edges",
        graph.node_count(),
        graph.edge_count()
    );

    Ok(RoadGraph {
        graph,
        node_lookup,
        rtree: RTree::bulk_load(points),
    })
}

/// Reads the active map data from `source` and builds a graph from it
///
/// # Errors
///
/// Propagates storage failures and graph validation errors
pub fn load_graph(source: &dyn MapDataSource) -> Result<RoadGraph, Error> {
    info!("Loading graph data into memory");
    let nodes = source.load_active_nodes()?;
    let edges = source.load_active_edges()?;
    build_graph(nodes, edges)
}
