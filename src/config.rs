use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use roadrouter_core::{EngineConfig, MapDataConfig};
use serde::Deserialize;

/// `roadrouter.toml`
///
/// ```toml
/// [engine]
/// cache_ttl_minutes = 30
/// max_waypoints = 10
///
/// [map]
/// nodes_path = "data/nodes.csv"
/// edges_path = "data/edges.csv"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    pub map: MapDataConfig,
}

impl AppConfig {
    /// Defaults with map files taken from `data_dir`
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            engine: EngineConfig::default(),
            map: MapDataConfig::from_dir(data_dir),
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;

        // Relative map paths are resolved against the config file
        if let Some(base) = path.parent() {
            config.map.nodes_path = base.join(&config.map.nodes_path);
            config.map.edges_path = base.join(&config.map.edges_path);
        }

        config
            .engine
            .validate()
            .with_context(|| format!("invalid [engine] section in {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_resolves_map_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roadrouter.toml");
        fs::write(
            &path,
            r#"
[engine]
cache_ttl_minutes = 5
max_cache_size = 100

[map]
nodes_path = "map/nodes.csv"
edges_path = "/srv/edges.csv"
"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.engine.cache_ttl_minutes, 5);
        assert_eq!(config.engine.max_cache_size, 100);
        assert_eq!(config.engine.max_waypoints, 10);
        assert_eq!(config.map.nodes_path, dir.path().join("map/nodes.csv"));
        assert_eq!(config.map.edges_path, PathBuf::from("/srv/edges.csv"));
    }

    #[test]
    fn test_engine_section_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roadrouter.toml");
        fs::write(&path, "[map]\nnodes_path = \"n.csv\"\nedges_path = \"e.csv\"\n").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn test_invalid_engine_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roadrouter.toml");
        fs::write(
            &path,
            "[engine]\nmax_route_distance_km = -1.0\n[map]\nnodes_path = \"n.csv\"\nedges_path = \"e.csv\"\n",
        )
        .unwrap();

        assert!(AppConfig::load(&path).is_err());
    }
}
