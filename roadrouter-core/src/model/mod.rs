//! Data model for road routing
//!
//! Contains the road network, computed routes and request telemetry.

pub mod geodesy;
pub mod roads;
pub mod route;
pub mod telemetry;

pub use geodesy::{Coordinate, EARTH_RADIUS_KM, haversine_distance, initial_bearing};
pub use roads::{
    EdgeId, GraphEdge, GraphStatistics, NodeId, NodeType, RoadCondition, RoadEdge, RoadGraph,
    RoadNode, RoadType,
};
pub use route::{
    AlternativeRoute, OptimizationCriteria, Route, RouteConstraints, RouteInstruction,
    RouteMetrics, RouteOptions, RouteStatus, Waypoint,
};
pub use telemetry::{CalculationRecord, CalculationStatus};
