//! Route persistence, the process-local route cache and telemetry statistics
//!
//! Persistence technology is abstracted behind the repository traits; the
//! in-memory implementations back tests and the command-line front end.

mod cache;
mod memory;
mod query;
mod repository;
mod route_store;
mod statistics;

use thiserror::Error;

pub use cache::{CacheKey, RouteCache};
pub use memory::{InMemoryCalculationRepository, InMemoryMapData, InMemoryRouteRepository};
pub use query::{Page, RouteQuery, SortOrder};
pub use repository::{CalculationRepository, MapDataSource, RouteRepository};
pub use route_store::{RouteStatistics, RouteStore};
pub use statistics::CalculationStatistics;

/// Failure reported by a storage collaborator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersistenceError {
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Duplicate record: {0}")]
    Duplicate(String),
    #[error("Storage backend error: {0}")]
    Backend(String),
}
