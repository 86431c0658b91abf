use log::{debug, warn};
use petgraph::graph::NodeIndex;
use rayon::prelude::*;

use super::criteria::{EdgeWeighting, estimated_cost};
use super::dijkstra::{ShortestPath, route_through};
use crate::model::{AlternativeRoute, OptimizationCriteria, RoadGraph};

pub const MAX_ALTERNATIVES: usize = 3;

/// Variations tried against the primary request, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlternativeKind {
    AvoidHighways,
    AvoidTolls,
    Fastest,
}

impl AlternativeKind {
    pub fn slug(self) -> &'static str {
        match self {
            AlternativeKind::AvoidHighways => "no-highways",
            AlternativeKind::AvoidTolls => "no-tolls",
            AlternativeKind::Fastest => "fastest",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            AlternativeKind::AvoidHighways => "Route avoiding highways",
            AlternativeKind::AvoidTolls => "Route avoiding toll roads",
            AlternativeKind::Fastest => "Fastest route",
        }
    }

    pub fn avoidance_factors(self) -> Vec<String> {
        match self {
            AlternativeKind::AvoidHighways => vec!["highways".to_string()],
            AlternativeKind::AvoidTolls => vec!["tolls".to_string()],
            AlternativeKind::Fastest => Vec::new(),
        }
    }

    /// Weighting for this variation, `None` when it would repeat the primary request
    fn weighting(self, primary: &EdgeWeighting) -> Option<EdgeWeighting> {
        match self {
            AlternativeKind::AvoidHighways if !primary.avoid_highways => {
                Some(primary.avoiding_highways())
            }
            AlternativeKind::AvoidTolls if !primary.avoid_tolls => Some(primary.avoiding_tolls()),
            AlternativeKind::Fastest if primary.criteria != OptimizationCriteria::Time => {
                Some(primary.with_criteria(OptimizationCriteria::Time))
            }
            _ => None,
        }
    }
}

const KINDS: [AlternativeKind; 3] = [
    AlternativeKind::AvoidHighways,
    AlternativeKind::AvoidTolls,
    AlternativeKind::Fastest,
];

/// Up to [`MAX_ALTERNATIVES`] routes through the same stops that differ from
/// `primary`.
///
/// Variations are searched in parallel. A variation without a path is
/// dropped, as is one whose node sequence equals the primary path or an
/// alternative already kept.
pub fn alternative_routes(
    graph: &RoadGraph,
    stops: &[NodeIndex],
    primary_weighting: &EdgeWeighting,
    primary: &ShortestPath,
    id_suffix: &str,
) -> Vec<AlternativeRoute> {
    let candidates: Vec<(AlternativeKind, EdgeWeighting)> = KINDS
        .into_iter()
        .filter_map(|kind| kind.weighting(primary_weighting).map(|w| (kind, w)))
        .collect();

    let results: Vec<(AlternativeKind, Option<ShortestPath>)> = candidates
        .par_iter()
        .map(|(kind, weighting)| (*kind, route_through(graph, stops, weighting)))
        .collect();

    let mut kept: Vec<(AlternativeKind, ShortestPath)> = Vec::with_capacity(MAX_ALTERNATIVES);
    for (kind, result) in results {
        let Some(path) = result else {
            warn!("Failed to calculate {} alternative", kind.slug());
            continue;
        };
        let duplicate = path.nodes == primary.nodes || kept.iter().any(|(_, p)| p.nodes == path.nodes);
        if duplicate {
            debug!("Dropping {} alternative: same path as an earlier route", kind.slug());
            continue;
        }
        kept.push((kind, path));
        if kept.len() == MAX_ALTERNATIVES {
            break;
        }
    }

    kept.into_iter()
        .map(|(kind, path)| AlternativeRoute {
            id: format!("alt-{}-{id_suffix}", kind.slug()),
            path: path
                .nodes
                .iter()
                .map(|&node| graph.node(node).id.clone())
                .collect(),
            distance: path.total_distance,
            duration: path.total_time,
            cost: estimated_cost(path.total_distance, path.total_toll),
            description: kind.description().to_string(),
            avoidance_factors: kind.avoidance_factors(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loading::build_graph;
    use crate::model::{Coordinate, NodeType, RoadEdge, RoadNode, RoadType};

    fn node(id: &str, lat: f64, lng: f64) -> RoadNode {
        RoadNode::new(id, Coordinate::new(lat, lng), NodeType::Intersection)
    }

    /// Three ways from a to d: highway (shortest), toll road, slow local road
    fn network() -> RoadGraph {
        build_graph(
            vec![
                node("a", 0.0, 0.0),
                node("h", 0.1, 0.1),
                node("t", 0.0, 0.1),
                node("l", -0.1, 0.1),
                node("d", 0.0, 0.2),
            ],
            vec![
                RoadEdge::new("ah", "a", "h", 4.0, 3.0).with_road_type(RoadType::Highway),
                RoadEdge::new("hd", "h", "d", 4.0, 3.0).with_road_type(RoadType::Highway),
                RoadEdge::new("at", "a", "t", 5.0, 2.0).with_toll(1.5),
                RoadEdge::new("td", "t", "d", 5.0, 2.0),
                RoadEdge::new("al", "a", "l", 6.0, 10.0),
                RoadEdge::new("ld", "l", "d", 6.0, 10.0),
            ],
        )
        .unwrap()
    }

    fn stops(graph: &RoadGraph) -> Vec<NodeIndex> {
        vec![graph.index_of("a").unwrap(), graph.index_of("d").unwrap()]
    }

    #[test]
    fn test_alternatives_in_priority_order() {
        let graph = network();
        let stops = stops(&graph);
        let weighting = EdgeWeighting::new(OptimizationCriteria::Distance);
        let primary = route_through(&graph, &stops, &weighting).unwrap();

        let alternatives = alternative_routes(&graph, &stops, &weighting, &primary, "1");

        // avoid highways -> toll road; avoid tolls -> highway again (dropped);
        // fastest -> toll road again (dropped)
        assert_eq!(alternatives.len(), 1);
        assert_eq!(alternatives[0].id, "alt-no-highways-1");
        assert_eq!(alternatives[0].path, vec!["a", "t", "d"]);
        assert_eq!(alternatives[0].cost, 3.0);
        assert_eq!(alternatives[0].avoidance_factors, vec!["highways"]);
    }

    #[test]
    fn test_variations_matching_primary_are_dropped() {
        let graph = network();
        let stops = stops(&graph);
        // Primary already avoids highways and tolls, only the time variation remains
        let weighting = EdgeWeighting::new(OptimizationCriteria::Distance)
            .avoiding_highways()
            .avoiding_tolls();
        let primary = route_through(&graph, &stops, &weighting).unwrap();
        assert_eq!(primary.total_distance, 12.0);

        let alternatives = alternative_routes(&graph, &stops, &weighting, &primary, "x");
        assert!(alternatives.is_empty());
    }

    #[test]
    fn test_avoidance_flags_carry_into_variations() {
        let graph = network();
        let stops = stops(&graph);
        let weighting = EdgeWeighting::new(OptimizationCriteria::Distance).avoiding_tolls();
        let primary = route_through(&graph, &stops, &weighting).unwrap();

        let alternatives = alternative_routes(&graph, &stops, &weighting, &primary, "7");
        let ids: Vec<&str> = alternatives.iter().map(|a| a.id.as_str()).collect();
        // avoid highways -> local road; fastest (still toll-free) -> highway, same as primary
        assert_eq!(ids, vec!["alt-no-highways-7"]);
        assert_eq!(alternatives[0].path, vec!["a", "l", "d"]);
        assert_eq!(alternatives[0].duration, 20.0);
        assert_eq!(alternatives[0].description, "Route avoiding highways");
    }

    #[test]
    fn test_variations_without_a_path_are_left_out() {
        // Only road is a toll highway: both avoidance variations find nothing
        let graph = build_graph(
            vec![node("a", 0.0, 0.0), node("b", 0.0, 0.1)],
            vec![
                RoadEdge::new("ab", "a", "b", 11.0, 6.0)
                    .with_road_type(RoadType::Highway)
                    .with_toll(2.0),
            ],
        )
        .unwrap();
        let stops = vec![graph.index_of("a").unwrap(), graph.index_of("b").unwrap()];
        let weighting = EdgeWeighting::new(OptimizationCriteria::Distance);
        let primary = route_through(&graph, &stops, &weighting).unwrap();

        assert!(route_through(&graph, &stops, &weighting.avoiding_highways()).is_none());
        assert!(route_through(&graph, &stops, &weighting.avoiding_tolls()).is_none());

        // fastest finds the same single edge and is dropped as a duplicate
        let alternatives = alternative_routes(&graph, &stops, &weighting, &primary, "0");
        assert!(alternatives.is_empty());
    }

    #[test]
    fn test_time_primary_gets_distance_based_variations() {
        let graph = network();
        let stops = stops(&graph);
        let weighting = EdgeWeighting::new(OptimizationCriteria::Time);
        let primary = route_through(&graph, &stops, &weighting).unwrap();
        // toll road is fastest
        assert_eq!(primary.total_time, 4.0);

        let alternatives = alternative_routes(&graph, &stops, &weighting, &primary, "t");
        let ids: Vec<&str> = alternatives.iter().map(|a| a.id.as_str()).collect();
        // avoid highways -> toll road (same as primary, dropped); avoid tolls -> highway
        assert_eq!(ids, vec!["alt-no-tolls-t"]);
        assert_eq!(alternatives[0].path, vec!["a", "h", "d"]);
        assert!(alternatives[0].avoidance_factors.iter().all(|f| f == "tolls"));
    }
}
