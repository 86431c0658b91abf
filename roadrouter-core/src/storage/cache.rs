use std::collections::VecDeque;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use log::trace;
use parking_lot::Mutex;

use crate::model::{Coordinate, OptimizationCriteria, Route, RouteConstraints, RouteOptions};

/// Identity of a route request in the process-local cache.
///
/// Coordinates are rounded to 6 decimals. Besides the criteria, every option
/// that changes the computed path is part of the key, so a route computed
/// without avoidance flags is never served to a caller that asked for them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    fn build(
        source: &Coordinate,
        destination: &Coordinate,
        via: &[Coordinate],
        criteria: OptimizationCriteria,
        constraints: &RouteConstraints,
    ) -> Self {
        let mut key = format!(
            "{:.6},{:.6}-{:.6},{:.6}-{}",
            source.latitude,
            source.longitude,
            destination.latitude,
            destination.longitude,
            criteria
        );
        for point in via {
            let _ = write!(key, "|via:{:.6},{:.6}", point.latitude, point.longitude);
        }
        let _ = write!(
            key,
            "|tolls:{}|highways:{}|vehicle:{}|max:{}",
            constraints.avoid_tolls,
            constraints.avoid_highways,
            constraints.vehicle_type.as_deref().unwrap_or("-"),
            constraints
                .max_distance
                .map_or_else(|| "-".to_string(), |d| d.to_string()),
        );
        Self(key)
    }

    pub fn for_request(
        source: &Coordinate,
        destination: &Coordinate,
        via: &[Coordinate],
        options: &RouteOptions,
    ) -> Self {
        Self::build(
            source,
            destination,
            via,
            options.optimization_criteria,
            &options.constraints(),
        )
    }

    pub fn for_route(route: &Route) -> Self {
        Self::build(
            &route.source,
            &route.destination,
            &route.via,
            route.optimization_criteria,
            &route.constraints,
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Default)]
struct CacheEntries {
    routes: HashMap<CacheKey, Route>,
    insertion_order: VecDeque<CacheKey>,
}

/// Bounded route cache with first-in-first-out eviction.
///
/// Eviction follows insertion order only; reads never refresh an entry.
/// Expired entries are not swept, they read as misses until overwritten
/// or evicted.
#[derive(Debug)]
pub struct RouteCache {
    capacity: usize,
    entries: Mutex<CacheEntries>,
}

impl RouteCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(CacheEntries::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cached route for `key` if it is still valid at `now`
    pub fn get(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<Route> {
        let entries = self.entries.lock();
        entries
            .routes
            .get(key)
            .filter(|route| route.is_valid_at(now))
            .cloned()
    }

    /// Stores `route` under its own key; see [`RouteCache::insert`]
    pub fn insert_route(&self, route: Route) {
        self.insert(CacheKey::for_route(&route), route);
    }

    /// Overwriting a present key keeps its place in the eviction order.
    /// A new key evicts the oldest inserted entry once the cache is full.
    pub fn insert(&self, key: CacheKey, route: Route) {
        if self.capacity == 0 {
            return;
        }

        let mut entries = self.entries.lock();
        if let Some(existing) = entries.routes.get_mut(&key) {
            *existing = route;
            return;
        }

        while entries.routes.len() >= self.capacity {
            let Some(oldest) = entries.insertion_order.pop_front() else {
                break;
            };
            entries.routes.remove(&oldest);
            trace!("Evicted cached route {}", oldest.as_str());
        }

        entries.insertion_order.push_back(key.clone());
        entries.routes.insert(key, route);
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.lock().routes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().routes.is_empty()
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        entries.routes.clear();
        entries.insertion_order.clear();
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use uuid::Uuid;

    use super::*;
    use crate::model::{RouteMetrics, RouteStatus};

    fn route_to(lat: f64, expires_at: DateTime<Utc>) -> Route {
        Route {
            id: Uuid::new_v4(),
            source: Coordinate::new(0.0, 0.0),
            destination: Coordinate::new(lat, 0.0),
            via: vec![],
            waypoints: vec![],
            total_distance: 0.0,
            estimated_duration: 0.0,
            estimated_cost: 0.0,
            optimization_criteria: OptimizationCriteria::Distance,
            constraints: RouteConstraints::default(),
            status: RouteStatus::Calculated,
            alternative_routes: vec![],
            route_metrics: RouteMetrics {
                algorithms_used: vec!["dijkstra".to_string()],
                calculation_time: 0.0,
                nodes_evaluated: 0,
                cache_hit: false,
            },
            route_instructions: vec![],
            calculated_at: expires_at - Duration::minutes(30),
            expires_at,
        }
    }

    #[test]
    fn test_key_rounds_to_six_decimals() {
        let options = RouteOptions::default();
        let a = CacheKey::for_request(
            &Coordinate::new(1.000_000_1, 2.0),
            &Coordinate::new(3.0, 4.0),
            &[],
            &options,
        );
        let b = CacheKey::for_request(
            &Coordinate::new(1.0, 2.0),
            &Coordinate::new(3.0, 4.0),
            &[],
            &options,
        );
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("1.000000,2.000000-3.000000,4.000000-distance"));
    }

    #[test]
    fn test_key_includes_avoidance_flags() {
        let src = Coordinate::new(1.0, 2.0);
        let dst = Coordinate::new(3.0, 4.0);
        let plain = CacheKey::for_request(&src, &dst, &[], &RouteOptions::default());
        let no_tolls = CacheKey::for_request(
            &src,
            &dst,
            &[],
            &RouteOptions {
                avoid_tolls: true,
                ..RouteOptions::default()
            },
        );
        assert_ne!(plain, no_tolls);
    }

    #[test]
    fn test_fifo_eviction_ignores_reads() {
        let cache = RouteCache::new(2);
        let now = Utc::now();
        let expires = now + Duration::minutes(30);

        let first = route_to(1.0, expires);
        let first_key = CacheKey::for_route(&first);
        cache.insert_route(first);
        cache.insert_route(route_to(2.0, expires));

        // A read does not protect the oldest entry
        assert!(cache.get(&first_key, now).is_some());

        let third = route_to(3.0, expires);
        let third_key = CacheKey::for_route(&third);
        cache.insert_route(third);

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&first_key, now).is_none());
        assert!(cache.get(&third_key, now).is_some());
    }

    #[test]
    fn test_overwrite_keeps_insertion_position() {
        let cache = RouteCache::new(2);
        let now = Utc::now();
        let expires = now + Duration::minutes(30);

        let first = route_to(1.0, expires);
        let first_key = CacheKey::for_route(&first);
        cache.insert_route(first);
        let second = route_to(2.0, expires);
        let second_key = CacheKey::for_route(&second);
        cache.insert_route(second);

        cache.insert_route(route_to(1.0, expires + Duration::minutes(5)));
        cache.insert_route(route_to(3.0, expires));

        assert!(!cache.contains(&first_key));
        assert!(cache.contains(&second_key));
    }

    #[test]
    fn test_expired_entry_reads_as_miss() {
        let cache = RouteCache::new(4);
        let now = Utc::now();
        let route = route_to(1.0, now);
        let key = CacheKey::for_route(&route);
        cache.insert_route(route);

        assert!(cache.contains(&key));
        assert!(cache.get(&key, now).is_none());
        assert!(cache.get(&key, now - Duration::seconds(1)).is_some());
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let cache = RouteCache::new(0);
        cache.insert_route(route_to(1.0, Utc::now() + Duration::minutes(1)));
        assert!(cache.is_empty());
    }
}
