//! Computed routes and the request options that produce them

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::geodesy::Coordinate;
use super::roads::NodeId;

/// Strategy used to weight edges during the search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationCriteria {
    #[default]
    Distance,
    Time,
    FuelEfficiency,
    Cost,
    TrafficAvoidance,
}

impl OptimizationCriteria {
    pub const ALL: [OptimizationCriteria; 5] = [
        OptimizationCriteria::Distance,
        OptimizationCriteria::Time,
        OptimizationCriteria::FuelEfficiency,
        OptimizationCriteria::Cost,
        OptimizationCriteria::TrafficAvoidance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OptimizationCriteria::Distance => "distance",
            OptimizationCriteria::Time => "time",
            OptimizationCriteria::FuelEfficiency => "fuel_efficiency",
            OptimizationCriteria::Cost => "cost",
            OptimizationCriteria::TrafficAvoidance => "traffic_avoidance",
        }
    }
}

impl fmt::Display for OptimizationCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptimizationCriteria {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|criteria| criteria.as_str() == s)
            .ok_or_else(|| format!("unknown optimization criteria '{s}'"))
    }
}

/// Caller options for a route calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteOptions {
    pub optimization_criteria: OptimizationCriteria,
    pub avoid_tolls: bool,
    pub avoid_highways: bool,
    pub vehicle_type: Option<String>,
    pub max_distance: Option<f64>,
    pub include_alternatives: bool,
    pub use_cache: bool,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            optimization_criteria: OptimizationCriteria::Distance,
            avoid_tolls: false,
            avoid_highways: false,
            vehicle_type: None,
            max_distance: None,
            include_alternatives: false,
            use_cache: true,
        }
    }
}

impl RouteOptions {
    pub fn with_criteria(optimization_criteria: OptimizationCriteria) -> Self {
        Self {
            optimization_criteria,
            ..Self::default()
        }
    }

    /// Options that shape the computed path, as stored on the route
    pub fn constraints(&self) -> RouteConstraints {
        RouteConstraints {
            avoid_tolls: self.avoid_tolls,
            avoid_highways: self.avoid_highways,
            vehicle_type: self.vehicle_type.clone(),
            max_distance: self.max_distance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteConstraints {
    pub avoid_tolls: bool,
    pub avoid_highways: bool,
    pub vehicle_type: Option<String>,
    pub max_distance: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    Calculated,
    Active,
    Completed,
    Cancelled,
}

impl RouteStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RouteStatus::Calculated => "calculated",
            RouteStatus::Active => "active",
            RouteStatus::Completed => "completed",
            RouteStatus::Cancelled => "cancelled",
        }
    }
}

/// Graph node visited by a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    pub node_id: NodeId,
    pub coordinate: Coordinate,
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeRoute {
    pub id: String,
    pub path: Vec<NodeId>,
    pub distance: f64,
    pub duration: f64,
    pub cost: f64,
    pub description: String,
    pub avoidance_factors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMetrics {
    pub algorithms_used: Vec<String>,
    /// Milliseconds
    pub calculation_time: f64,
    pub nodes_evaluated: usize,
    pub cache_hit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteInstruction {
    pub step: usize,
    pub instruction: String,
    /// Kilometers
    pub distance: f64,
    /// Minutes
    pub duration: f64,
    pub coordinate: Coordinate,
}

/// A computed route.
///
/// Distances are kilometers, durations minutes and cost is in currency
/// units rounded to cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: Uuid,
    pub source: Coordinate,
    pub destination: Coordinate,
    /// Intermediate stops requested by the caller
    #[serde(default)]
    pub via: Vec<Coordinate>,
    pub waypoints: Vec<Waypoint>,
    pub total_distance: f64,
    pub estimated_duration: f64,
    pub estimated_cost: f64,
    pub optimization_criteria: OptimizationCriteria,
    #[serde(default)]
    pub constraints: RouteConstraints,
    pub status: RouteStatus,
    pub alternative_routes: Vec<AlternativeRoute>,
    pub route_metrics: RouteMetrics,
    pub route_instructions: Vec<RouteInstruction>,
    pub calculated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Route {
    /// A route can be served from cache only strictly before `expires_at`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Whether this route answers a request with the given parameters
    pub fn matches_request(
        &self,
        source: &Coordinate,
        destination: &Coordinate,
        via: &[Coordinate],
        options: &RouteOptions,
    ) -> bool {
        self.source == *source
            && self.destination == *destination
            && self.via == via
            && self.optimization_criteria == options.optimization_criteria
            && self.constraints == options.constraints()
    }
}
