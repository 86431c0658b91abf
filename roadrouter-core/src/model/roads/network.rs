//! In-memory directed road graph

use std::collections::BTreeMap;
use std::f64::consts::FRAC_PI_2;

use hashbrown::HashMap;
use petgraph::graph::{DiGraph, EdgeIndex, Edges, NodeIndex};
use petgraph::Directed;
use rstar::{AABB, RTree, primitives::GeomWithData};
use serde::Serialize;

use super::components::{GraphEdge, RoadNode};
use crate::model::geodesy::{Coordinate, EARTH_RADIUS_KM, haversine_distance};

/// Node position (lon, lat) in the spatial index
pub type IndexedPoint = GeomWithData<[f64; 2], NodeIndex>;

/// Directed weighted road graph.
///
/// Built once from node and edge records and never edited afterwards;
/// a reload produces a new graph (see [`crate::GraphStore`]).
#[derive(Clone)]
pub struct RoadGraph {
    pub(crate) graph: DiGraph<RoadNode, GraphEdge>,
    pub(crate) node_lookup: HashMap<String, NodeIndex>,
    pub(crate) rtree: RTree<IndexedPoint>,
}

impl Default for RoadGraph {
    fn default() -> Self {
        Self {
            graph: DiGraph::new(),
            node_lookup: HashMap::new(),
            rtree: RTree::new(),
        }
    }
}

impl std::fmt::Debug for RoadGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoadGraph")
            .field("nodes", &self.graph.node_count())
            .field("edges", &self.graph.edge_count())
            .finish()
    }
}

/// Summary of a graph generation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStatistics {
    pub node_count: usize,
    pub edge_count: usize,
    pub avg_degree: f64,
    pub node_types: BTreeMap<String, usize>,
}

impl RoadGraph {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn node(&self, index: NodeIndex) -> &RoadNode {
        &self.graph[index]
    }

    pub fn edge(&self, index: EdgeIndex) -> &GraphEdge {
        &self.graph[index]
    }

    /// `(source, target)` of an edge
    pub fn edge_endpoints(&self, index: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(index)
    }

    pub fn index_of(&self, node_id: &str) -> Option<NodeIndex> {
        self.node_lookup.get(node_id).copied()
    }

    pub fn node_by_id(&self, node_id: &str) -> Option<&RoadNode> {
        self.index_of(node_id).map(|idx| &self.graph[idx])
    }

    /// Outgoing edges of `node`
    pub fn edges(&self, node: NodeIndex) -> Edges<'_, GraphEdge, Directed> {
        self.graph.edges(node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &RoadNode> {
        self.graph.node_weights()
    }

    /// Closest node to `coordinate` with its haversine distance in km.
    ///
    /// Linear scan over every node, so each call is O(n). Ties go to the node
    /// inserted first. `None` for an empty graph or an invalid coordinate.
    pub fn nearest_node(&self, coordinate: &Coordinate) -> Option<(NodeIndex, f64)> {
        if !coordinate.is_valid() {
            return None;
        }

        let mut nearest: Option<(NodeIndex, f64)> = None;

        for index in self.graph.node_indices() {
            let distance = haversine_distance(coordinate, &self.graph[index].coordinate);
            match nearest {
                Some((_, best)) if distance >= best => {}
                _ => nearest = Some((index, distance)),
            }
        }

        nearest
    }

    /// Nodes within `radius_km` of `coordinate`, closest first
    pub fn nodes_within_radius(
        &self,
        coordinate: &Coordinate,
        radius_km: f64,
    ) -> Vec<(NodeIndex, f64)> {
        if !coordinate.is_valid() || !(radius_km >= 0.0) {
            return Vec::new();
        }

        let candidates: Vec<NodeIndex> = match search_envelope(coordinate, radius_km) {
            Some(envelope) => self
                .rtree
                .locate_in_envelope(&envelope)
                .map(|point| point.data)
                .collect(),
            None => self.graph.node_indices().collect(),
        };

        let mut within: Vec<(NodeIndex, f64)> = candidates
            .into_iter()
            .filter_map(|index| {
                let distance = haversine_distance(coordinate, &self.graph[index].coordinate);
                (distance <= radius_km).then_some((index, distance))
            })
            .collect();

        within.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        within
    }

    pub fn statistics(&self) -> GraphStatistics {
        let node_count = self.node_count();
        let edge_count = self.edge_count();

        #[allow(clippy::cast_precision_loss)]
        let avg_degree = if node_count > 0 {
            edge_count as f64 / node_count as f64
        } else {
            0.0
        };

        let mut node_types = BTreeMap::new();
        for node in self.graph.node_weights() {
            *node_types
                .entry(node.node_type.as_str().to_string())
                .or_insert(0) += 1;
        }

        GraphStatistics {
            node_count,
            edge_count,
            avg_degree,
            node_types,
        }
    }
}

/// Lon/lat box containing the spherical cap of `radius_km` around `center`.
///
/// `None` when the cap reaches a pole or crosses the antimeridian, in which
/// case callers fall back to a full scan.
fn search_envelope(center: &Coordinate, radius_km: f64) -> Option<AABB<[f64; 2]>> {
    let angular = radius_km / EARTH_RADIUS_KM;
    if angular >= FRAC_PI_2 {
        return None;
    }

    let lat_delta = angular.to_degrees();
    let min_lat = center.latitude - lat_delta;
    let max_lat = center.latitude + lat_delta;
    if min_lat <= -90.0 || max_lat >= 90.0 {
        return None;
    }

    let ratio = angular.sin() / center.latitude.to_radians().cos();
    if ratio >= 1.0 {
        return None;
    }
    // Small margin so boundary nodes survive the exact haversine filter
    let lon_delta = ratio.asin().to_degrees() * 1.001 + 1e-9;
    let lat_delta = lat_delta * 1.001 + 1e-9;

    let min_lng = center.longitude - lon_delta;
    let max_lng = center.longitude + lon_delta;
    if min_lng < -180.0 || max_lng > 180.0 {
        return None;
    }

    Some(AABB::from_corners(
        [min_lng, center.latitude - lat_delta],
        [max_lng, center.latitude + lat_delta],
    ))
}
