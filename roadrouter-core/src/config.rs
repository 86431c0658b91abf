//! Engine tuning knobs

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Lifetime of a computed route in the cache, minutes
    pub cache_ttl_minutes: u32,
    /// Process-local cache capacity
    pub max_cache_size: usize,
    /// Via points accepted per request
    pub max_waypoints: usize,
    /// Straight-line source to destination limit, kilometers
    pub max_route_distance_km: f64,
    /// Most recent telemetry records used for statistics
    pub statistics_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl_minutes: 30,
            max_cache_size: 10_000,
            max_waypoints: 10,
            max_route_distance_km: 5_000.0,
            statistics_window: 1_000,
        }
    }
}

impl EngineConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::minutes(i64::from(self.cache_ttl_minutes))
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !(self.max_route_distance_km > 0.0) {
            return Err(Error::InvalidData(format!(
                "max_route_distance_km must be positive, got {}",
                self.max_route_distance_km
            )));
        }
        if self.statistics_window == 0 {
            return Err(Error::InvalidData(
                "statistics_window must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
