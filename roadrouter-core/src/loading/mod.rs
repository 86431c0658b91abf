//! This module is responsible for reading road map data (CSV files or any
//! other [`MapDataSource`](crate::storage::MapDataSource)) and building the
//! road graph used for routing.

mod builder;
mod config;
pub mod csv;
mod store;

pub use builder::{build_graph, load_graph};
pub use config::MapDataConfig;
pub use csv::CsvMapData;
pub use store::GraphStore;
