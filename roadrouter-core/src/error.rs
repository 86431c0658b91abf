use thiserror::Error;

use crate::model::Coordinate;
use crate::storage::PersistenceError;

/// Which end of a requested route could not be placed on the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Source,
    Destination,
    Via(usize),
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Source => write!(f, "source"),
            Endpoint::Destination => write!(f, "destination"),
            Endpoint::Via(idx) => write!(f, "via point {idx}"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not find nearest node for {endpoint} at {coordinate}")]
    UnresolvedEndpoint {
        endpoint: Endpoint,
        coordinate: Coordinate,
    },
    #[error("No route found between source and destination")]
    NoRouteFound,
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
    #[error("GeoJSON error: {0}")]
    GeoJsonError(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}
