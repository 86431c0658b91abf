//! Road network components - nodes, edges and their classifications

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::model::Coordinate;

pub type NodeId = String;
pub type EdgeId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Intersection,
    Warehouse,
    DeliveryPoint,
    HighwayJunction,
    CityCenter,
    Residential,
    #[serde(other)]
    Other,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Intersection => "intersection",
            NodeType::Warehouse => "warehouse",
            NodeType::DeliveryPoint => "delivery_point",
            NodeType::HighwayJunction => "highway_junction",
            NodeType::CityCenter => "city_center",
            NodeType::Residential => "residential",
            NodeType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadType {
    Highway,
    Arterial,
    Collector,
    Commercial,
    Residential,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadCondition {
    Excellent,
    Good,
    Fair,
    Poor,
    Construction,
}

impl RoadCondition {
    /// Multiplier applied to the traffic-adjusted distance of an edge
    pub fn penalty(self) -> f64 {
        match self {
            RoadCondition::Excellent | RoadCondition::Good => 1.0,
            RoadCondition::Fair => 1.2,
            RoadCondition::Poor => 1.5,
            RoadCondition::Construction => 2.0,
        }
    }
}

/// Road graph node (map location)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadNode {
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    pub coordinate: Coordinate,
    pub node_type: NodeType,
    /// Free-form attributes such as `trafficLevel`
    #[serde(default)]
    pub properties: Map<String, JsonValue>,
    pub is_active: bool,
}

impl RoadNode {
    pub fn new(id: impl Into<NodeId>, coordinate: Coordinate, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            coordinate,
            node_type,
            properties: Map::new(),
            is_active: true,
        }
    }
}

/// Directed road segment between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadEdge {
    pub id: EdgeId,
    pub from_node_id: NodeId,
    pub to_node_id: NodeId,
    pub distance_km: f64,
    pub estimated_time_minutes: f64,
    pub road_type: RoadType,
    pub road_condition: RoadCondition,
    pub speed_limit: f64,
    pub traffic_multiplier: f64,
    #[serde(default)]
    pub toll_cost: f64,
    #[serde(default)]
    pub is_bidirectional: bool,
    pub is_active: bool,
}

impl RoadEdge {
    /// Local road in good condition with no traffic and no toll
    pub fn new(
        id: impl Into<EdgeId>,
        from: impl Into<NodeId>,
        to: impl Into<NodeId>,
        distance_km: f64,
        estimated_time_minutes: f64,
    ) -> Self {
        Self {
            id: id.into(),
            from_node_id: from.into(),
            to_node_id: to.into(),
            distance_km,
            estimated_time_minutes,
            road_type: RoadType::Local,
            road_condition: RoadCondition::Good,
            speed_limit: 50.0,
            traffic_multiplier: 1.0,
            toll_cost: 0.0,
            is_bidirectional: false,
            is_active: true,
        }
    }

    #[must_use]
    pub fn with_road_type(mut self, road_type: RoadType) -> Self {
        self.road_type = road_type;
        self
    }

    #[must_use]
    pub fn with_condition(mut self, road_condition: RoadCondition) -> Self {
        self.road_condition = road_condition;
        self
    }

    #[must_use]
    pub fn with_toll(mut self, toll_cost: f64) -> Self {
        self.toll_cost = toll_cost;
        self
    }

    #[must_use]
    pub fn with_traffic(mut self, traffic_multiplier: f64) -> Self {
        self.traffic_multiplier = traffic_multiplier;
        self
    }

    /// Edge going the opposite way with the same road attributes
    pub fn reversed(&self, id: impl Into<EdgeId>) -> Self {
        Self {
            id: id.into(),
            from_node_id: self.to_node_id.clone(),
            to_node_id: self.from_node_id.clone(),
            ..self.clone()
        }
    }

    /// Static traffic and condition adjusted weight
    pub fn base_weight(&self) -> f64 {
        self.distance_km * self.traffic_multiplier * self.road_condition.penalty()
    }
}

/// Edge as stored in the road graph, with its precomputed weight
#[derive(Debug, Clone)]
pub struct GraphEdge {
    pub edge: RoadEdge,
    pub weight: f64,
}

impl GraphEdge {
    pub fn new(edge: RoadEdge) -> Self {
        let weight = edge.base_weight();
        Self { edge, weight }
    }

    pub fn distance(&self) -> f64 {
        self.edge.distance_km
    }

    pub fn travel_time(&self) -> f64 {
        self.edge.estimated_time_minutes
    }

    pub fn toll_cost(&self) -> f64 {
        self.edge.toll_cost
    }
}
