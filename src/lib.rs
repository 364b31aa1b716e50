//! Converts OSM data (Overpass API JSON or OSM XML) into a GeoJSON
//! `FeatureCollection`.
//!
//! Multipolygon and route relations are assembled from their member ways,
//! closed ways with area tagging become polygons, interestingly tagged
//! nodes become points. Overpass `out center`, `out bb` and `out geom`
//! responses are supported.

mod convert;
pub mod element;
pub mod geojson;
pub mod options;
pub mod parser;

pub use convert::OsmToGeoJson;
