// Re-export key components
pub use crate::config::EngineConfig;
pub use crate::loading::{CsvMapData, GraphStore, MapDataConfig};
pub use crate::routing::RouteOptimizer;
pub use crate::storage::{
    CalculationStatistics, InMemoryCalculationRepository, InMemoryMapData,
    InMemoryRouteRepository, MapDataSource, RouteQuery, RouteStatistics, SortOrder,
};
pub use crate::{Error, clock::Clock};

// Core types for the road network
pub use crate::model::{
    Coordinate, GraphStatistics, NodeType, RoadCondition, RoadEdge, RoadNode, RoadType,
};

// Core types for computed routes
pub use crate::model::{
    AlternativeRoute, OptimizationCriteria, Route, RouteInstruction, RouteOptions, RouteStatus,
};
