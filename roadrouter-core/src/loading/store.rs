use std::sync::Arc;

use log::info;
use parking_lot::{Mutex, RwLock};

use super::builder::load_graph;
use crate::model::{Coordinate, GraphStatistics, RoadGraph, RoadNode};
use crate::storage::MapDataSource;
use crate::Error;

/// Owner of the active road graph generation.
///
/// Readers take an `Arc` snapshot and keep using it for as long as they need;
/// [`GraphStore::refresh`] builds a complete new graph before swapping it in,
/// so a snapshot is always one fully built generation.
#[derive(Debug)]
pub struct GraphStore {
    source: Arc<dyn MapDataSource>,
    current: RwLock<Arc<RoadGraph>>,
    refresh_lock: Mutex<()>,
}

impl GraphStore {
    /// Loads the initial graph from `source`
    ///
    /// # Errors
    ///
    /// Fails when the source cannot be read or holds invalid map data
    pub fn open(source: Arc<dyn MapDataSource>) -> Result<Self, Error> {
        let graph = load_graph(source.as_ref())?;
        Ok(Self::with_graph(source, graph))
    }

    pub fn with_graph(source: Arc<dyn MapDataSource>, graph: RoadGraph) -> Self {
        Self {
            source,
            current: RwLock::new(Arc::new(graph)),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Current graph generation
    pub fn snapshot(&self) -> Arc<RoadGraph> {
        Arc::clone(&self.current.read())
    }

    pub fn source(&self) -> &Arc<dyn MapDataSource> {
        &self.source
    }

    /// Reloads map data and atomically replaces the active graph.
    ///
    /// Concurrent refreshes are serialised. On error the previous graph stays
    /// active.
    ///
    /// # Errors
    ///
    /// Propagates storage failures and graph validation errors
    pub fn refresh(&self) -> Result<GraphStatistics, Error> {
        let _writer = self.refresh_lock.lock();

        let graph = load_graph(self.source.as_ref())?;
        let stats = graph.statistics();
        *self.current.write() = Arc::new(graph);

        info!(
            "Graph refreshed: {} nodes, {} edges",
            stats.node_count, stats.edge_count
        );
        Ok(stats)
    }

    pub fn nearest_node(&self, coordinate: &Coordinate) -> Option<RoadNode> {
        let graph = self.snapshot();
        graph
            .nearest_node(coordinate)
            .map(|(index, _)| graph.node(index).clone())
    }

    /// Nodes within `radius_km` of `coordinate` with their distance, closest first
    pub fn nodes_within_radius(&self, coordinate: &Coordinate, radius_km: f64) -> Vec<(RoadNode, f64)> {
        let graph = self.snapshot();
        graph
            .nodes_within_radius(coordinate, radius_km)
            .into_iter()
            .map(|(index, distance)| (graph.node(index).clone(), distance))
            .collect()
    }

    pub fn statistics(&self) -> GraphStatistics {
        self.snapshot().statistics()
    }
}
