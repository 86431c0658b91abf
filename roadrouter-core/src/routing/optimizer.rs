use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use petgraph::graph::NodeIndex;
use uuid::Uuid;

use super::alternatives::alternative_routes;
use super::criteria::{EdgeWeighting, estimated_cost};
use super::dijkstra::route_through;
use super::instructions::route_instructions;
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::Endpoint;
use crate::loading::GraphStore;
use crate::model::{
    CalculationRecord, Coordinate, GraphStatistics, RoadGraph, RoadNode, Route, RouteMetrics,
    RouteOptions, RouteStatus, Waypoint, haversine_distance,
};
use crate::storage::{
    CacheKey, CalculationRepository, CalculationStatistics, InMemoryCalculationRepository,
    InMemoryRouteRepository, MapDataSource, Page, RouteCache, RouteQuery, RouteRepository,
    RouteStatistics, RouteStore,
};
use crate::Error;

pub const ALGORITHM_NAME: &str = "dijkstra";

#[allow(clippy::cast_precision_loss)]
fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_micros() as f64 / 1000.0
}

/// Route calculation service.
///
/// Owns the active road graph, the process-local route cache, the route store
/// and calculation telemetry. All operations take `&self`; share it behind an
/// `Arc` across threads.
#[derive(Debug)]
pub struct RouteOptimizer {
    config: EngineConfig,
    graph: GraphStore,
    cache: RouteCache,
    routes: RouteStore,
    calculations: Arc<dyn CalculationRepository>,
    clock: Arc<dyn Clock>,
}

impl RouteOptimizer {
    /// # Errors
    ///
    /// Returns an error if `config` is invalid
    pub fn new(
        config: EngineConfig,
        graph: GraphStore,
        route_repository: Arc<dyn RouteRepository>,
        calculations: Arc<dyn CalculationRepository>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, Error> {
        config.validate()?;
        info!(
            "Route optimizer ready: {} nodes, cache capacity {}, TTL {} min",
            graph.snapshot().node_count(),
            config.max_cache_size,
            config.cache_ttl_minutes
        );
        Ok(Self {
            cache: RouteCache::new(config.max_cache_size),
            routes: RouteStore::new(route_repository, Arc::clone(&clock)),
            config,
            graph,
            calculations,
            clock,
        })
    }

    /// Optimizer over `map_data` with in-memory route and telemetry storage
    /// and the system clock
    ///
    /// # Errors
    ///
    /// Fails when the map data cannot be loaded or `config` is invalid
    pub fn in_memory(config: EngineConfig, map_data: Arc<dyn MapDataSource>) -> Result<Self, Error> {
        Self::new(
            config,
            GraphStore::open(map_data)?,
            Arc::new(InMemoryRouteRepository::new()),
            Arc::new(InMemoryCalculationRepository::new()),
            Arc::new(SystemClock),
        )
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &RouteCache {
        &self.cache
    }

    pub fn graph(&self) -> &GraphStore {
        &self.graph
    }

    /// Calculates the best route from `source` to `destination` through the
    /// `via` points in order.
    ///
    /// Via points shape the path: each one is snapped to its nearest node and
    /// the search runs leg by leg through those nodes, so the result can be
    /// longer than the direct route.
    ///
    /// Every call leaves one telemetry record behind, ending `cached`,
    /// `completed` or `failed`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidRequest`] for out of range coordinates, too many via
    ///   points or a straight-line distance above the configured limit
    /// - [`Error::UnresolvedEndpoint`] when the graph is empty
    /// - [`Error::NoRouteFound`] when no permitted path exists
    /// - [`Error::Persistence`] when storage fails
    pub fn calculate_route(
        &self,
        source: Coordinate,
        destination: Coordinate,
        via: &[Coordinate],
        options: &RouteOptions,
    ) -> Result<Route, Error> {
        let started = Instant::now();
        let mut record = CalculationRecord::pending(source, destination, options, self.clock.now());
        self.calculations.insert(&record)?;

        match self.run_calculation(&mut record, started, source, destination, via, options) {
            Ok(route) => Ok(route),
            Err(err) => {
                warn!("Route calculation {} failed: {err}", record.id);
                let recorded = record
                    .mark_failed(elapsed_ms(started), err.to_string(), self.clock.now())
                    .and_then(|()| self.calculations.update(&record).map_err(Error::from));
                if let Err(telemetry_err) = recorded {
                    warn!("Could not record failure of calculation {}: {telemetry_err}", record.id);
                }
                Err(err)
            }
        }
    }

    fn run_calculation(
        &self,
        record: &mut CalculationRecord,
        started: Instant,
        source: Coordinate,
        destination: Coordinate,
        via: &[Coordinate],
        options: &RouteOptions,
    ) -> Result<Route, Error> {
        self.validate_request(&source, &destination, via)?;

        if options.use_cache
            && let Some(mut route) = self.cached_route(&source, &destination, via, options)?
        {
            route.route_metrics.cache_hit = true;
            record.mark_cached(elapsed_ms(started), self.clock.now())?;
            self.calculations.update(record)?;
            debug!("Serving route {} from cache", route.id);
            return Ok(route);
        }

        record.mark_in_progress(self.clock.now())?;
        self.calculations.update(record)?;

        // One generation for the whole calculation
        let graph = self.graph.snapshot();
        let stops = resolve_stops(&graph, &source, &destination, via)?;

        let weighting = EdgeWeighting::from_options(options);
        let path = route_through(&graph, &stops, &weighting).ok_or(Error::NoRouteFound)?;

        let calculated_at = self.clock.now();
        let alternatives = if options.include_alternatives {
            let suffix = calculated_at.timestamp_millis().to_string();
            alternative_routes(&graph, &stops, &weighting, &path, &suffix)
        } else {
            Vec::new()
        };

        let waypoints = path
            .nodes
            .iter()
            .enumerate()
            .map(|(order, &index)| {
                let node = graph.node(index);
                Waypoint {
                    node_id: node.id.clone(),
                    coordinate: node.coordinate,
                    order,
                }
            })
            .collect();

        let mut route = Route {
            id: Uuid::new_v4(),
            source,
            destination,
            via: via.to_vec(),
            waypoints,
            total_distance: path.total_distance,
            estimated_duration: path.total_time,
            estimated_cost: estimated_cost(path.total_distance, path.total_toll),
            optimization_criteria: options.optimization_criteria,
            constraints: options.constraints(),
            status: RouteStatus::Calculated,
            alternative_routes: alternatives,
            route_metrics: RouteMetrics {
                algorithms_used: vec![ALGORITHM_NAME.to_string()],
                calculation_time: 0.0,
                nodes_evaluated: path.nodes_evaluated,
                cache_hit: false,
            },
            route_instructions: route_instructions(&graph, &path),
            calculated_at,
            expires_at: calculated_at + self.config.cache_ttl(),
        };
        route.route_metrics.calculation_time = elapsed_ms(started);

        self.routes.store(&route)?;
        self.cache.insert_route(route.clone());

        record.mark_completed(
            route.route_metrics.calculation_time,
            path.nodes_evaluated,
            route.id,
            self.clock.now(),
        )?;
        self.calculations.update(record)?;

        info!(
            "Route calculated: {:.2}km, {}min, {} nodes evaluated",
            route.total_distance, route.estimated_duration, path.nodes_evaluated
        );
        Ok(route)
    }

    fn validate_request(
        &self,
        source: &Coordinate,
        destination: &Coordinate,
        via: &[Coordinate],
    ) -> Result<(), Error> {
        if !source.is_valid() {
            return Err(Error::InvalidRequest(format!("Invalid source coordinate {source}")));
        }
        if !destination.is_valid() {
            return Err(Error::InvalidRequest(format!(
                "Invalid destination coordinate {destination}"
            )));
        }
        if let Some((idx, point)) = via.iter().enumerate().find(|(_, point)| !point.is_valid()) {
            return Err(Error::InvalidRequest(format!(
                "Invalid coordinate {point} for via point {idx}"
            )));
        }
        if via.len() > self.config.max_waypoints {
            return Err(Error::InvalidRequest(format!(
                "{} via points requested, at most {} allowed",
                via.len(),
                self.config.max_waypoints
            )));
        }

        let straight_line = haversine_distance(source, destination);
        if straight_line > self.config.max_route_distance_km {
            return Err(Error::InvalidRequest(format!(
                "Source and destination are {straight_line:.1} km apart, limit is {} km",
                self.config.max_route_distance_km
            )));
        }
        Ok(())
    }

    /// Unexpired route for the request from the cache, falling back to the
    /// newest matching stored route
    fn cached_route(
        &self,
        source: &Coordinate,
        destination: &Coordinate,
        via: &[Coordinate],
        options: &RouteOptions,
    ) -> Result<Option<Route>, Error> {
        let now = self.clock.now();
        let key = CacheKey::for_request(source, destination, via, options);
        if let Some(route) = self.cache.get(&key, now) {
            return Ok(Some(route));
        }

        let stored = self
            .routes
            .repository()
            .find_latest_exact(source, destination, via, options)?;
        match stored {
            Some(route) if route.is_valid_at(now) => {
                debug!("Repopulating cache with stored route {}", route.id);
                self.cache.insert(key, route.clone());
                Ok(Some(route))
            }
            _ => Ok(None),
        }
    }

    pub fn route_by_id(&self, id: Uuid) -> Result<Option<Route>, Error> {
        self.routes.route_by_id(id)
    }

    pub fn routes(&self, query: &RouteQuery) -> Result<Page<Route>, Error> {
        self.routes.routes(query)
    }

    pub fn update_route_status(&self, id: Uuid, status: RouteStatus) -> Result<(), Error> {
        self.routes.update_route_status(id, status)
    }

    pub fn route_statistics(&self) -> Result<RouteStatistics, Error> {
        self.routes.route_statistics()
    }

    /// Aggregates over the most recent calculations
    pub fn calculation_statistics(&self) -> Result<CalculationStatistics, Error> {
        let records = self.calculations.recent(self.config.statistics_window)?;
        Ok(CalculationStatistics::from_records(&records))
    }

    pub fn nearest_node(&self, coordinate: &Coordinate) -> Option<RoadNode> {
        self.graph.nearest_node(coordinate)
    }

    pub fn nodes_within_radius(&self, coordinate: &Coordinate, radius_km: f64) -> Vec<(RoadNode, f64)> {
        self.graph.nodes_within_radius(coordinate, radius_km)
    }

    /// Rebuilds the graph from map data; calculations already running keep
    /// the graph they started with
    pub fn refresh_graph_data(&self) -> Result<GraphStatistics, Error> {
        self.graph.refresh()
    }

    pub fn graph_statistics(&self) -> GraphStatistics {
        self.graph.statistics()
    }

    pub fn cleanup_old_routes(&self, days_old: u32) -> Result<usize, Error> {
        self.routes.cleanup_old_routes(days_old)
    }

    pub fn cleanup_expired_routes(&self) -> Result<usize, Error> {
        self.routes.cleanup_expired_routes()
    }
}

fn resolve(graph: &RoadGraph, coordinate: &Coordinate, endpoint: Endpoint) -> Result<NodeIndex, Error> {
    graph
        .nearest_node(coordinate)
        .map(|(index, _)| index)
        .ok_or(Error::UnresolvedEndpoint {
            endpoint,
            coordinate: *coordinate,
        })
}

fn resolve_stops(
    graph: &RoadGraph,
    source: &Coordinate,
    destination: &Coordinate,
    via: &[Coordinate],
) -> Result<Vec<NodeIndex>, Error> {
    let mut stops = Vec::with_capacity(via.len() + 2);
    stops.push(resolve(graph, source, Endpoint::Source)?);
    for (idx, point) in via.iter().enumerate() {
        stops.push(resolve(graph, point, Endpoint::Via(idx))?);
    }
    stops.push(resolve(graph, destination, Endpoint::Destination)?);
    Ok(stops)
}
