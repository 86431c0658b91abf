//! Path search and route assembly

pub mod alternatives;
pub mod criteria;
pub mod dijkstra;
pub mod instructions;
mod optimizer;
mod to_geojson;

pub use alternatives::{AlternativeKind, MAX_ALTERNATIVES, alternative_routes};
pub use criteria::{COST_PER_KM, EdgeWeighting, criteria_cost, estimated_cost};
pub use dijkstra::{ShortestPath, route_through, shortest_path};
pub use instructions::{bearing_to_direction, route_instructions};
pub use optimizer::{ALGORITHM_NAME, RouteOptimizer};
