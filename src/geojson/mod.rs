use serde::Serialize;
use serde_json::{Map, Value};

pub mod rewind;

/// `[longitude, latitude]`.
pub type Position = [f64; 2];

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Position),
    LineString(Vec<Position>),
    Polygon(Vec<Vec<Position>>),
    MultiLineString(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

#[derive(Clone, Debug, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: String,
    pub properties: Map<String, Value>,
    pub geometry: Geometry,
}

impl Feature {
    pub fn new(id: String, properties: Map<String, Value>, geometry: Geometry) -> Feature {
        Feature {
            kind: "Feature",
            id,
            properties,
            geometry,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> FeatureCollection {
        FeatureCollection {
            kind: "FeatureCollection",
            features,
        }
    }
}

#[test]
fn geometry_serializes_to_standard_geojson() {
    let geometry = Geometry::Point([2.0, 1.0]);
    let json = serde_json::to_value(&geometry).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"type": "Point", "coordinates": [2.0, 1.0]})
    );
}

#[test]
fn feature_collection_serializes_with_type_tags() {
    let feature = Feature::new(
        "node/1".to_string(),
        Map::new(),
        Geometry::LineString(vec![[0.0, 0.0], [1.0, 1.0]]),
    );
    let collection = FeatureCollection::new(vec![feature]);
    let json = serde_json::to_value(&collection).unwrap();
    assert_eq!(json["type"], "FeatureCollection");
    assert_eq!(json["features"][0]["type"], "Feature");
    assert_eq!(json["features"][0]["id"], "node/1");
    assert_eq!(json["features"][0]["geometry"]["type"], "LineString");
}
