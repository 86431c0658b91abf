//! Process-local repository implementations

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use super::{
    CalculationRepository, MapDataSource, Page, PersistenceError, RouteQuery, RouteRepository,
};
use crate::model::{
    CalculationRecord, Coordinate, RoadEdge, RoadNode, Route, RouteOptions, RouteStatus,
};

fn upsert<T: Clone>(rows: &mut Vec<T>, incoming: &[T], id: impl Fn(&T) -> &str) {
    for item in incoming {
        match rows.iter_mut().find(|row| id(row) == id(item)) {
            Some(existing) => *existing = item.clone(),
            None => rows.push(item.clone()),
        }
    }
}

/// Map nodes and edges kept in memory, in insertion order
#[derive(Debug, Default)]
pub struct InMemoryMapData {
    nodes: RwLock<Vec<RoadNode>>,
    edges: RwLock<Vec<RoadEdge>>,
}

impl InMemoryMapData {
    pub fn new(nodes: Vec<RoadNode>, edges: Vec<RoadEdge>) -> Self {
        Self {
            nodes: RwLock::new(nodes),
            edges: RwLock::new(edges),
        }
    }
}

impl MapDataSource for InMemoryMapData {
    fn load_active_nodes(&self) -> Result<Vec<RoadNode>, PersistenceError> {
        Ok(self
            .nodes
            .read()
            .iter()
            .filter(|node| node.is_active)
            .cloned()
            .collect())
    }

    fn load_active_edges(&self) -> Result<Vec<RoadEdge>, PersistenceError> {
        Ok(self
            .edges
            .read()
            .iter()
            .filter(|edge| edge.is_active)
            .cloned()
            .collect())
    }

    fn save_nodes(&self, nodes: &[RoadNode]) -> Result<(), PersistenceError> {
        upsert(&mut self.nodes.write(), nodes, |node| node.id.as_str());
        Ok(())
    }

    fn save_edges(&self, edges: &[RoadEdge]) -> Result<(), PersistenceError> {
        upsert(&mut self.edges.write(), edges, |edge| edge.id.as_str());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRouteRepository {
    routes: RwLock<Vec<Route>>,
}

impl InMemoryRouteRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.routes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.read().is_empty()
    }
}

impl RouteRepository for InMemoryRouteRepository {
    fn insert(&self, route: &Route) -> Result<(), PersistenceError> {
        let mut routes = self.routes.write();
        if routes.iter().any(|existing| existing.id == route.id) {
            return Err(PersistenceError::Duplicate(format!("route {}", route.id)));
        }
        routes.push(route.clone());
        Ok(())
    }

    fn get(&self, id: Uuid) -> Result<Option<Route>, PersistenceError> {
        Ok(self.routes.read().iter().find(|r| r.id == id).cloned())
    }

    fn find_latest_exact(
        &self,
        source: &Coordinate,
        destination: &Coordinate,
        via: &[Coordinate],
        options: &RouteOptions,
    ) -> Result<Option<Route>, PersistenceError> {
        Ok(self
            .routes
            .read()
            .iter()
            .filter(|r| r.status == RouteStatus::Calculated)
            .filter(|r| r.matches_request(source, destination, via, options))
            .max_by_key(|r| r.calculated_at)
            .cloned())
    }

    fn query(&self, query: &RouteQuery) -> Result<Page<Route>, PersistenceError> {
        Ok(query.apply(self.routes.read().iter()))
    }

    fn update_status(&self, id: Uuid, status: RouteStatus) -> Result<(), PersistenceError> {
        let mut routes = self.routes.write();
        let route = routes
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| PersistenceError::NotFound(format!("route {id}")))?;
        route.status = status;
        Ok(())
    }

    fn all(&self) -> Result<Vec<Route>, PersistenceError> {
        Ok(self.routes.read().clone())
    }

    fn delete_calculated_before(&self, cutoff: DateTime<Utc>) -> Result<usize, PersistenceError> {
        let mut routes = self.routes.write();
        let before = routes.len();
        routes.retain(|r| r.calculated_at >= cutoff);
        Ok(before - routes.len())
    }

    fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, PersistenceError> {
        let mut routes = self.routes.write();
        let before = routes.len();
        routes.retain(|r| r.expires_at > now);
        Ok(before - routes.len())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCalculationRepository {
    records: RwLock<Vec<CalculationRecord>>,
}

impl InMemoryCalculationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: Uuid) -> Option<CalculationRecord> {
        self.records.read().iter().find(|r| r.id == id).cloned()
    }

    pub fn all(&self) -> Vec<CalculationRecord> {
        self.records.read().clone()
    }
}

impl CalculationRepository for InMemoryCalculationRepository {
    fn insert(&self, record: &CalculationRecord) -> Result<(), PersistenceError> {
        let mut records = self.records.write();
        if records.iter().any(|r| r.id == record.id) {
            return Err(PersistenceError::Duplicate(format!("calculation {}", record.id)));
        }
        records.push(record.clone());
        Ok(())
    }

    fn update(&self, record: &CalculationRecord) -> Result<(), PersistenceError> {
        let mut records = self.records.write();
        let existing = records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| PersistenceError::NotFound(format!("calculation {}", record.id)))?;
        *existing = record.clone();
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<CalculationRecord>, PersistenceError> {
        let records = self.records.read();
        let mut newest_first: Vec<CalculationRecord> = records.iter().rev().cloned().collect();
        // later inserts win ties
        newest_first.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        newest_first.truncate(limit);
        Ok(newest_first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeType;

    #[test]
    fn test_map_data_upsert_and_active_filter() {
        let store = InMemoryMapData::default();
        let mut node = RoadNode::new("a", Coordinate::new(0.0, 0.0), NodeType::Warehouse);
        store.save_nodes(&[node.clone()]).unwrap();

        node.is_active = false;
        store
            .save_nodes(&[
                node,
                RoadNode::new("b", Coordinate::new(1.0, 1.0), NodeType::CityCenter),
            ])
            .unwrap();

        let active = store.load_active_nodes().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "b");
    }

    #[test]
    fn test_update_unknown_calculation_fails() {
        let repo = InMemoryCalculationRepository::new();
        let record = CalculationRecord::pending(
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 1.0),
            &RouteOptions::default(),
            Utc::now(),
        );
        assert!(matches!(
            repo.update(&record),
            Err(PersistenceError::NotFound(_))
        ));
    }

    #[test]
    fn test_recent_is_newest_first_and_limited() {
        let repo = InMemoryCalculationRepository::new();
        let start = Utc::now();
        for minutes in 0..5 {
            let record = CalculationRecord::pending(
                Coordinate::new(0.0, 0.0),
                Coordinate::new(1.0, 1.0),
                &RouteOptions::default(),
                start + chrono::Duration::minutes(minutes),
            );
            repo.insert(&record).unwrap();
        }

        let recent = repo.recent(3).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].created_at, start + chrono::Duration::minutes(4));
        assert_eq!(recent[2].created_at, start + chrono::Duration::minutes(2));
    }
}
