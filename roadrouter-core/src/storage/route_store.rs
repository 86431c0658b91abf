use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Duration;
use log::info;
use serde::Serialize;
use uuid::Uuid;

use super::{Page, RouteQuery, RouteRepository};
use crate::Error;
use crate::clock::Clock;
use crate::model::{Route, RouteStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStatistics {
    pub total_routes: usize,
    pub routes_by_status: BTreeMap<String, usize>,
    pub routes_by_optimization: BTreeMap<String, usize>,
    pub average_distance: f64,
    pub average_duration: f64,
}

/// Stored routes: lookup, listing, aggregation and cleanup
#[derive(Debug, Clone)]
pub struct RouteStore {
    repository: Arc<dyn RouteRepository>,
    clock: Arc<dyn Clock>,
}

impl RouteStore {
    pub fn new(repository: Arc<dyn RouteRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub fn repository(&self) -> &Arc<dyn RouteRepository> {
        &self.repository
    }

    pub fn store(&self, route: &Route) -> Result<(), Error> {
        self.repository.insert(route)?;
        Ok(())
    }

    pub fn route_by_id(&self, id: Uuid) -> Result<Option<Route>, Error> {
        Ok(self.repository.get(id)?)
    }

    pub fn routes(&self, query: &RouteQuery) -> Result<Page<Route>, Error> {
        Ok(self.repository.query(query)?)
    }

    pub fn update_route_status(&self, id: Uuid, status: RouteStatus) -> Result<(), Error> {
        self.repository.update_status(id, status)?;
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn route_statistics(&self) -> Result<RouteStatistics, Error> {
        let routes = self.repository.all()?;
        let total_routes = routes.len();

        let mut routes_by_status = BTreeMap::new();
        let mut routes_by_optimization = BTreeMap::new();
        let mut total_distance = 0.0;
        let mut total_duration = 0.0;

        for route in &routes {
            *routes_by_status
                .entry(route.status.as_str().to_string())
                .or_insert(0) += 1;
            *routes_by_optimization
                .entry(route.optimization_criteria.as_str().to_string())
                .or_insert(0) += 1;
            total_distance += route.total_distance;
            total_duration += route.estimated_duration;
        }

        let average = |sum: f64| {
            if total_routes > 0 {
                sum / total_routes as f64
            } else {
                0.0
            }
        };

        Ok(RouteStatistics {
            total_routes,
            routes_by_status,
            routes_by_optimization,
            average_distance: average(total_distance),
            average_duration: average(total_duration),
        })
    }

    /// Deletes routes calculated more than `days_old` days ago
    pub fn cleanup_old_routes(&self, days_old: u32) -> Result<usize, Error> {
        let cutoff = self.clock.now() - Duration::days(i64::from(days_old));
        let deleted = self.repository.delete_calculated_before(cutoff)?;
        info!("Cleaned up {deleted} routes older than {days_old} days");
        Ok(deleted)
    }

    /// Deletes routes past their expiry
    pub fn cleanup_expired_routes(&self) -> Result<usize, Error> {
        let deleted = self.repository.delete_expired(self.clock.now())?;
        info!("Cleaned up {deleted} expired routes");
        Ok(deleted)
    }
}
