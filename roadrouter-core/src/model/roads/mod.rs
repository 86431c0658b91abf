//! Road network model

pub mod components;
pub mod network;

pub use components::{EdgeId, GraphEdge, NodeId, NodeType, RoadCondition, RoadEdge, RoadNode, RoadType};
pub use network::{GraphStatistics, IndexedPoint, RoadGraph};
