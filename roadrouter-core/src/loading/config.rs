use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Location of the CSV map data files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDataConfig {
    pub nodes_path: PathBuf,
    pub edges_path: PathBuf,
}

impl MapDataConfig {
    /// `nodes.csv` and `edges.csv` inside `dir`
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            nodes_path: dir.join("nodes.csv"),
            edges_path: dir.join("edges.csv"),
        }
    }
}
