use geo::{Coord, LineString, Point};
use geojson::{Feature, FeatureCollection, Geometry, Value as GeoJsonValue};
use serde_json::json;

use crate::Error;
use crate::model::{Route, RouteInstruction};

impl Route {
    /// Converts the route to a `GeoJSON` `FeatureCollection`: the path as a
    /// line string followed by one point per instruction.
    pub fn to_geojson(&self) -> Result<FeatureCollection, Error> {
        let mut features = Vec::with_capacity(self.route_instructions.len() + 1);
        features.push(self.path_feature()?);
        for instruction in &self.route_instructions {
            features.push(instruction_feature(instruction)?);
        }

        Ok(FeatureCollection {
            features,
            bbox: None,
            foreign_members: None,
        })
    }

    pub fn to_geojson_string(&self) -> Result<String, Error> {
        serde_json::to_string(&self.to_geojson()?).map_err(|e| Error::GeoJsonError(e.to_string()))
    }

    fn path_feature(&self) -> Result<Feature, Error> {
        let coords: Vec<Coord<f64>> = self
            .waypoints
            .iter()
            .map(|waypoint| Point::from(waypoint.coordinate).into())
            .collect();
        let geometry = Geometry::new(GeoJsonValue::from(&LineString::new(coords)));

        let value = json!({
            "type": "Feature",
            "geometry": geometry,
            "properties": {
                "feature_type": "route",
                "route_id": self.id.to_string(),
                "optimization_criteria": self.optimization_criteria.as_str(),
                "total_distance": self.total_distance,
                "estimated_duration": self.estimated_duration,
                "estimated_cost": self.estimated_cost,
                "status": self.status.as_str(),
                "node_ids": self.waypoints.iter().map(|w| w.node_id.as_str()).collect::<Vec<_>>(),
            }
        });

        Feature::from_json_value(value).map_err(|e| Error::GeoJsonError(e.to_string()))
    }
}

fn instruction_feature(instruction: &RouteInstruction) -> Result<Feature, Error> {
    let point = Point::from(instruction.coordinate);
    let geometry = Geometry::new(GeoJsonValue::from(&point));

    let value = json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": {
            "feature_type": "instruction",
            "step": instruction.step,
            "instruction": instruction.instruction,
            "distance": instruction.distance,
            "duration": instruction.duration,
        }
    });

    Feature::from_json_value(value).map_err(|e| Error::GeoJsonError(e.to_string()))
}
