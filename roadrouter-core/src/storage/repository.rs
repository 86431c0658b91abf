use std::fmt::Debug;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Page, PersistenceError, RouteQuery};
use crate::model::{
    CalculationRecord, Coordinate, RoadEdge, RoadNode, Route, RouteOptions, RouteStatus,
};

/// Persisted map data the road graph is built from
pub trait MapDataSource: Send + Sync + Debug {
    fn load_active_nodes(&self) -> Result<Vec<RoadNode>, PersistenceError>;

    fn load_active_edges(&self) -> Result<Vec<RoadEdge>, PersistenceError>;

    /// Insert or replace nodes by id
    fn save_nodes(&self, nodes: &[RoadNode]) -> Result<(), PersistenceError>;

    /// Insert or replace edges by id
    fn save_edges(&self, edges: &[RoadEdge]) -> Result<(), PersistenceError>;
}

pub trait RouteRepository: Send + Sync + Debug {
    fn insert(&self, route: &Route) -> Result<(), PersistenceError>;

    fn get(&self, id: Uuid) -> Result<Option<Route>, PersistenceError>;

    /// Most recently calculated route with status `calculated` for exactly
    /// these coordinates and options
    fn find_latest_exact(
        &self,
        source: &Coordinate,
        destination: &Coordinate,
        via: &[Coordinate],
        options: &RouteOptions,
    ) -> Result<Option<Route>, PersistenceError>;

    fn query(&self, query: &RouteQuery) -> Result<Page<Route>, PersistenceError>;

    fn update_status(&self, id: Uuid, status: RouteStatus) -> Result<(), PersistenceError>;

    fn all(&self) -> Result<Vec<Route>, PersistenceError>;

    /// Deletes routes calculated strictly before `cutoff`, returns the count
    fn delete_calculated_before(&self, cutoff: DateTime<Utc>) -> Result<usize, PersistenceError>;

    /// Deletes routes whose `expires_at` is at or before `now`, returns the count
    fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, PersistenceError>;
}

pub trait CalculationRepository: Send + Sync + Debug {
    fn insert(&self, record: &CalculationRecord) -> Result<(), PersistenceError>;

    /// Replaces the stored record with the same id
    fn update(&self, record: &CalculationRecord) -> Result<(), PersistenceError>;

    /// Up to `limit` records, newest first
    fn recent(&self, limit: usize) -> Result<Vec<CalculationRecord>, PersistenceError>;
}
