//! Road route optimization engine.
//!
//! Loads a directed, weighted road network, answers shortest-path requests
//! under several optimization criteria and keeps computed routes in a TTL
//! cache backed by a route store. [`RouteOptimizer`] is the entry point.

pub mod clock;
pub mod config;
pub mod error;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod routing;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use error::{Endpoint, Error};
pub use loading::{CsvMapData, GraphStore, MapDataConfig, build_graph, load_graph};
pub use model::{
    Coordinate, NodeId, OptimizationCriteria, RoadEdge, RoadGraph, RoadNode, Route, RouteOptions,
    RouteStatus,
};
pub use routing::RouteOptimizer;
