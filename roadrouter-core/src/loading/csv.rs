//! CSV map data: `nodes.csv` and `edges.csv`
//!
//! Node properties are stored as a JSON object in a single column. An edge
//! row with `is_bidirectional = true` stands for both directions; the reverse
//! edge is synthesized on load with the id `<id>:rev`.

use std::fs::File;
use std::io;
use std::path::Path;

use log::{debug, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use super::MapDataConfig;
use crate::model::{Coordinate, NodeType, RoadCondition, RoadEdge, RoadNode, RoadType};
use crate::storage::{MapDataSource, PersistenceError};

pub const REVERSE_EDGE_SUFFIX: &str = ":rev";

fn default_active() -> bool {
    true
}

fn default_multiplier() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRow {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub node_type: NodeType,
    #[serde(default)]
    pub properties: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRow {
    pub id: String,
    pub from_node_id: String,
    pub to_node_id: String,
    pub distance_km: f64,
    pub estimated_time_minutes: f64,
    pub road_type: RoadType,
    pub road_condition: RoadCondition,
    #[serde(default)]
    pub speed_limit: f64,
    #[serde(default = "default_multiplier")]
    pub traffic_multiplier: f64,
    #[serde(default)]
    pub toll_cost: f64,
    #[serde(default)]
    pub is_bidirectional: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl NodeRow {
    fn into_node(self) -> Result<RoadNode, PersistenceError> {
        let properties = if self.properties.trim().is_empty() {
            Map::new()
        } else {
            serde_json::from_str::<Map<String, JsonValue>>(&self.properties).map_err(|e| {
                PersistenceError::Backend(format!("Node {} has invalid properties: {e}", self.id))
            })?
        };

        Ok(RoadNode {
            id: self.id,
            name: self.name,
            coordinate: Coordinate::new(self.latitude, self.longitude),
            node_type: self.node_type,
            properties,
            is_active: self.is_active,
        })
    }
}

impl From<&RoadNode> for NodeRow {
    fn from(node: &RoadNode) -> Self {
        let properties = if node.properties.is_empty() {
            String::new()
        } else {
            JsonValue::Object(node.properties.clone()).to_string()
        };
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            latitude: node.coordinate.latitude,
            longitude: node.coordinate.longitude,
            node_type: node.node_type,
            properties,
            is_active: node.is_active,
        }
    }
}

impl From<EdgeRow> for RoadEdge {
    fn from(row: EdgeRow) -> Self {
        Self {
            id: row.id,
            from_node_id: row.from_node_id,
            to_node_id: row.to_node_id,
            distance_km: row.distance_km,
            estimated_time_minutes: row.estimated_time_minutes,
            road_type: row.road_type,
            road_condition: row.road_condition,
            speed_limit: row.speed_limit,
            traffic_multiplier: row.traffic_multiplier,
            toll_cost: row.toll_cost,
            is_bidirectional: row.is_bidirectional,
            is_active: row.is_active,
        }
    }
}

impl From<&RoadEdge> for EdgeRow {
    fn from(edge: &RoadEdge) -> Self {
        Self {
            id: edge.id.clone(),
            from_node_id: edge.from_node_id.clone(),
            to_node_id: edge.to_node_id.clone(),
            distance_km: edge.distance_km,
            estimated_time_minutes: edge.estimated_time_minutes,
            road_type: edge.road_type,
            road_condition: edge.road_condition,
            speed_limit: edge.speed_limit,
            traffic_multiplier: edge.traffic_multiplier,
            toll_cost: edge.toll_cost,
            is_bidirectional: edge.is_bidirectional,
            is_active: edge.is_active,
        }
    }
}

fn backend(path: &Path, err: impl std::fmt::Display) -> PersistenceError {
    PersistenceError::Backend(format!("{}: {err}", path.display()))
}

/// Reads every row of a CSV file, failing on the first malformed record
pub fn read_csv_file<T>(path: &Path) -> Result<Vec<T>, PersistenceError>
where
    T: for<'de> Deserialize<'de>,
{
    let file = File::open(path).map_err(|e| backend(path, e))?;
    csv::Reader::from_reader(file)
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| backend(path, e))
}

/// Like [`read_csv_file`], but a missing file reads as empty
fn read_existing<T>(path: &Path) -> Result<Vec<T>, PersistenceError>
where
    T: for<'de> Deserialize<'de>,
{
    match File::open(path) {
        Ok(_) => read_csv_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(backend(path, e)),
    }
}

pub fn write_csv_file<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), PersistenceError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| backend(path, e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| backend(path, e))?;
    }
    writer.flush().map_err(|e| backend(path, e))
}

fn upsert_rows<T>(rows: &mut Vec<T>, incoming: Vec<T>, id: impl Fn(&T) -> &str) {
    for item in incoming {
        match rows.iter().position(|row| id(row) == id(&item)) {
            Some(pos) => rows[pos] = item,
            None => rows.push(item),
        }
    }
}

/// Map data source backed by a pair of CSV files
#[derive(Debug)]
pub struct CsvMapData {
    config: MapDataConfig,
    write_lock: Mutex<()>,
}

impl CsvMapData {
    pub fn new(config: MapDataConfig) -> Self {
        Self {
            config,
            write_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &MapDataConfig {
        &self.config
    }
}

impl MapDataSource for CsvMapData {
    fn load_active_nodes(&self) -> Result<Vec<RoadNode>, PersistenceError> {
        let rows: Vec<NodeRow> = read_csv_file(&self.config.nodes_path)?;
        let nodes = rows
            .into_iter()
            .filter(|row| row.is_active)
            .map(NodeRow::into_node)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            "Read {} active nodes from {}",
            nodes.len(),
            self.config.nodes_path.display()
        );
        Ok(nodes)
    }

    fn load_active_edges(&self) -> Result<Vec<RoadEdge>, PersistenceError> {
        let rows: Vec<EdgeRow> = read_csv_file(&self.config.edges_path)?;
        let mut edges = Vec::with_capacity(rows.len());

        for row in rows.into_iter().filter(|row| row.is_active) {
            let edge = RoadEdge::from(row);
            let reverse = edge
                .is_bidirectional
                .then(|| edge.reversed(format!("{}{REVERSE_EDGE_SUFFIX}", edge.id)));
            edges.push(edge);
            edges.extend(reverse);
        }

        debug!(
            "Read {} active directed edges from {}",
            edges.len(),
            self.config.edges_path.display()
        );
        Ok(edges)
    }

    fn save_nodes(&self, nodes: &[RoadNode]) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock();
        let path = &self.config.nodes_path;

        let mut rows: Vec<NodeRow> = read_existing(path)?;
        upsert_rows(&mut rows, nodes.iter().map(NodeRow::from).collect(), |row| {
            row.id.as_str()
        });
        write_csv_file(path, &rows)
    }

    fn save_edges(&self, edges: &[RoadEdge]) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock();
        let path = &self.config.edges_path;

        let mut rows: Vec<EdgeRow> = read_existing(path)?;
        let mut incoming = Vec::with_capacity(edges.len());
        for edge in edges {
            // reverse halves of bidirectional rows are derived on load
            let derived = edge.id.strip_suffix(REVERSE_EDGE_SUFFIX).is_some_and(|base| {
                edges.iter().any(|e| e.id == base && e.is_bidirectional)
                    || rows.iter().any(|row| row.id == base && row.is_bidirectional)
            });
            if derived {
                continue;
            }
            incoming.push(EdgeRow::from(edge));
        }

        if incoming.len() < edges.len() {
            warn!(
                "Skipped {} derived reverse edges when writing {}",
                edges.len() - incoming.len(),
                path.display()
            );
        }
        upsert_rows(&mut rows, incoming, |row| row.id.as_str());
        write_csv_file(path, &rows)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::loading::build_graph;

    const NODES: &str = "\
id,name,latitude,longitude,node_type,properties,is_active
a,Depot,0.0,0.0,warehouse,\"{\"\"trafficLevel\"\":\"\"low\"\"}\",true
b,,0.0,1.0,intersection,,true
c,Closed,1.0,1.0,intersection,,false
";

    const EDGES: &str = "\
id,from_node_id,to_node_id,distance_km,estimated_time_minutes,road_type,road_condition,speed_limit,traffic_multiplier,toll_cost,is_bidirectional,is_active
ab,a,b,111.0,60.0,arterial,good,60,1.0,0,true,true
bc,b,c,10.0,6.0,local,fair,50,1.0,0,false,true
";

    fn write_fixture(dir: &Path) -> MapDataConfig {
        let config = MapDataConfig::from_dir(dir);
        fs::write(&config.nodes_path, NODES).unwrap();
        fs::write(&config.edges_path, EDGES).unwrap();
        config
    }

    #[test]
    fn test_reads_active_nodes_with_properties() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvMapData::new(write_fixture(dir.path()));

        let nodes = source.load_active_nodes().unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].node_type, NodeType::Warehouse);
        assert_eq!(nodes[0].properties["trafficLevel"], "low");
        assert!(nodes[1].properties.is_empty());
    }

    #[test]
    fn test_bidirectional_row_expands_to_two_edges() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvMapData::new(write_fixture(dir.path()));

        let edges = source.load_active_edges().unwrap();
        let ids: Vec<&str> = edges.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["ab", "ab:rev", "bc"]);
        assert_eq!(edges[1].from_node_id, "b");
        assert_eq!(edges[1].to_node_id, "a");

        let graph = build_graph(
            source.load_active_nodes().unwrap(),
            source.load_active_edges().unwrap(),
        )
        .unwrap();
        // bc points at an inactive node
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_save_upserts_and_skips_derived_edges() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvMapData::new(write_fixture(dir.path()));

        let mut edges = source.load_active_edges().unwrap();
        edges[0].toll_cost = 4.5;
        edges.push(RoadEdge::new("ba2", "b", "a", 120.0, 70.0));
        source.save_edges(&edges).unwrap();

        let rows: Vec<EdgeRow> = read_csv_file(&source.config().edges_path).unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["ab", "bc", "ba2"]);
        assert_eq!(rows[0].toll_cost, 4.5);

        let mut depot = source.load_active_nodes().unwrap().remove(0);
        depot.name = "Main depot".to_string();
        source.save_nodes(&[depot]).unwrap();
        let nodes = source.load_active_nodes().unwrap();
        assert_eq!(nodes[0].name, "Main depot");
        assert_eq!(nodes[0].properties["trafficLevel"], "low");
    }

    #[test]
    fn test_save_creates_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvMapData::new(MapDataConfig::from_dir(dir.path()));

        source
            .save_nodes(&[RoadNode::new(
                "x",
                Coordinate::new(10.0, 20.0),
                NodeType::CityCenter,
            )])
            .unwrap();
        let nodes = source.load_active_nodes().unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].coordinate, Coordinate::new(10.0, 20.0));
    }

    #[test]
    fn test_missing_file_is_backend_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvMapData::new(MapDataConfig::from_dir(dir.path()));
        assert!(matches!(
            source.load_active_edges(),
            Err(PersistenceError::Backend(_))
        ));
    }
}
