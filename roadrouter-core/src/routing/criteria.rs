//! Edge weighting per optimization criteria and avoidance filtering

use crate::model::{GraphEdge, OptimizationCriteria, RoadType, RouteOptions};

/// Price per kilometer used in the route cost estimate
pub const COST_PER_KM: f64 = 0.15;

/// How the search prices edges: which edges are usable and what they cost
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeWeighting {
    pub criteria: OptimizationCriteria,
    pub avoid_tolls: bool,
    pub avoid_highways: bool,
}

impl EdgeWeighting {
    pub fn new(criteria: OptimizationCriteria) -> Self {
        Self {
            criteria,
            avoid_tolls: false,
            avoid_highways: false,
        }
    }

    pub fn from_options(options: &RouteOptions) -> Self {
        Self {
            criteria: options.optimization_criteria,
            avoid_tolls: options.avoid_tolls,
            avoid_highways: options.avoid_highways,
        }
    }

    #[must_use]
    pub fn avoiding_tolls(mut self) -> Self {
        self.avoid_tolls = true;
        self
    }

    #[must_use]
    pub fn avoiding_highways(mut self) -> Self {
        self.avoid_highways = true;
        self
    }

    #[must_use]
    pub fn with_criteria(mut self, criteria: OptimizationCriteria) -> Self {
        self.criteria = criteria;
        self
    }

    /// Whether the search may traverse `edge` at all
    pub fn allows(&self, edge: &GraphEdge) -> bool {
        if self.avoid_tolls && edge.toll_cost() > 0.0 {
            return false;
        }
        if self.avoid_highways && edge.edge.road_type == RoadType::Highway {
            return false;
        }
        true
    }

    /// Search cost of `edge`, `None` when the edge is filtered out
    pub fn cost(&self, edge: &GraphEdge) -> Option<f64> {
        self.allows(edge).then(|| criteria_cost(self.criteria, edge))
    }
}

pub fn criteria_cost(criteria: OptimizationCriteria, edge: &GraphEdge) -> f64 {
    match criteria {
        OptimizationCriteria::Distance => edge.distance(),
        OptimizationCriteria::Time => edge.travel_time(),
        OptimizationCriteria::FuelEfficiency => edge.distance() * 1.2,
        OptimizationCriteria::Cost => edge.distance() + edge.toll_cost() * 10.0,
        OptimizationCriteria::TrafficAvoidance => edge.weight * 1.5,
    }
}

/// Monetary estimate for a path, rounded to cents
pub fn estimated_cost(total_distance: f64, total_toll: f64) -> f64 {
    let cost = total_distance * COST_PER_KM + total_toll;
    (cost * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RoadCondition, RoadEdge};

    fn edge() -> GraphEdge {
        GraphEdge::new(
            RoadEdge::new("e", "a", "b", 10.0, 7.0)
                .with_toll(2.0)
                .with_traffic(1.5)
                .with_condition(RoadCondition::Fair),
        )
    }

    #[test]
    fn test_criteria_costs() {
        let edge = edge();
        let cost = |criteria| criteria_cost(criteria, &edge);

        assert!((cost(OptimizationCriteria::Distance) - 10.0).abs() < 1e-9);
        assert!((cost(OptimizationCriteria::Time) - 7.0).abs() < 1e-9);
        assert!((cost(OptimizationCriteria::FuelEfficiency) - 12.0).abs() < 1e-9);
        assert!((cost(OptimizationCriteria::Cost) - 30.0).abs() < 1e-9);
        // 10 * 1.5 traffic * 1.2 fair condition * 1.5
        assert!((cost(OptimizationCriteria::TrafficAvoidance) - 27.0).abs() < 1e-9);
    }

    #[test]
    fn test_avoidance_filters() {
        let toll = edge();
        let highway = GraphEdge::new(
            RoadEdge::new("h", "a", "b", 5.0, 3.0).with_road_type(RoadType::Highway),
        );
        let base = EdgeWeighting::new(OptimizationCriteria::Distance);

        assert_eq!(base.cost(&toll), Some(10.0));
        assert_eq!(base.avoiding_tolls().cost(&toll), None);
        assert!(base.avoiding_tolls().allows(&highway));
        assert!(!base.avoiding_highways().allows(&highway));
        assert!(base.avoiding_highways().allows(&toll));
    }

    #[test]
    fn test_estimated_cost_rounds_to_cents() {
        assert_eq!(estimated_cost(111.0, 0.0), 16.65);
        assert_eq!(estimated_cost(10.0, 2.333), 3.83);
        assert_eq!(estimated_cost(0.0, 0.0), 0.0);
    }
}
