//! Overpass API JSON parser. Accepts either a bare element array or the
//! full response object with an `elements` key.

use anyhow::{bail, Result};
use serde_json::{Map, Value};

use super::{anonymous_node_id, Bounds, Parsed, UNKNOWN_LOCATION_ID};
use crate::element::{ElementKind, Member, Meta, Node, OsmId, Relation, Tags, Way, FULL_GEOM_PREFIX};

pub fn parse(data: &str) -> Result<Parsed> {
    let root: Value = match serde_json::from_str(data) {
        Ok(root) => root,
        Err(error) => bail!("input is not valid JSON: {}", error),
    };
    let elements = match &root {
        Value::Array(items) => items.as_slice(),
        Value::Object(object) => match object.get("elements").and_then(Value::as_array) {
            Some(items) => items.as_slice(),
            None => bail!("input has no \"elements\" array"),
        },
        _ => bail!("input is neither an element array nor an Overpass response object"),
    };

    let mut parsed = Parsed::new();
    for element in elements {
        let object = match element.as_object() {
            Some(object) => object,
            None => continue,
        };
        match object.get("type").and_then(Value::as_str) {
            Some("node") => parse_node(object, &mut parsed),
            Some("way") => parse_way(object, &mut parsed),
            Some("relation") => parse_relation(object, &mut parsed),
            _ => {}
        }
    }
    Ok(parsed)
}

fn parse_node(object: &Map<String, Value>, parsed: &mut Parsed) {
    let id = match object.get("id").and_then(OsmId::from_json) {
        Some(id) => id,
        None => return,
    };
    parsed.nodes.push(Node {
        kind: ElementKind::Node,
        id,
        lat: object.get("lat").and_then(Value::as_f64),
        lon: object.get("lon").and_then(Value::as_f64),
        tags: tags_of(object),
        meta: meta_of(object),
        is_center_placeholder: false,
    });
}

fn parse_way(object: &Map<String, Value>, parsed: &mut Parsed) {
    let id = match object.get("id").and_then(OsmId::from_json) {
        Some(id) => id,
        None => return,
    };
    let tags = tags_of(object);
    let meta = meta_of(object);
    let mut nodes: Vec<OsmId> = object
        .get("nodes")
        .and_then(Value::as_array)
        .map(|refs| {
            refs.iter()
                .map(|value| {
                    OsmId::from_json(value)
                        .unwrap_or_else(|| OsmId::Str(UNKNOWN_LOCATION_ID.to_string()))
                })
                .collect()
        })
        .unwrap_or_default();

    if let Some(center) = object.get("center").and_then(Value::as_object) {
        parsed.add_center_placeholder(
            ElementKind::Way,
            id.clone(),
            tags.clone(),
            meta.clone(),
            center.get("lat").and_then(Value::as_f64),
            center.get("lon").and_then(Value::as_f64),
        );
    }

    let geometry = object.get("geometry").and_then(Value::as_array);
    if let Some(geometry) = geometry {
        if nodes.is_empty() {
            nodes = geometry.iter().map(coordinate_ref).collect();
        }
        for (index, entry) in geometry.iter().enumerate() {
            let lat = entry.get("lat").and_then(Value::as_f64);
            let lon = entry.get("lon").and_then(Value::as_f64);
            if let (Some(lat), Some(lon), Some(node_id)) = (lat, lon, nodes.get(index)) {
                parsed.add_full_geometry_node(node_id.clone(), lat, lon);
            }
        }
    }

    parsed.ways.push(Way {
        kind: ElementKind::Way,
        id: id.clone(),
        nodes,
        tags: tags.clone(),
        meta: meta.clone(),
        is_bounds_placeholder: false,
    });

    if geometry.is_none() {
        if let Some(bounds) = bounds_of(object) {
            parsed.add_bounds_placeholder(ElementKind::Way, &id, tags, meta, bounds);
        }
    }
}

fn parse_relation(object: &Map<String, Value>, parsed: &mut Parsed) {
    let id = match object.get("id").and_then(OsmId::from_json) {
        Some(id) => id,
        None => return,
    };
    let tags = tags_of(object);
    let meta = meta_of(object);
    let raw_members = object.get("members").and_then(Value::as_array);

    if let Some(center) = object.get("center").and_then(Value::as_object) {
        parsed.add_center_placeholder(
            ElementKind::Relation,
            id.clone(),
            tags.clone(),
            meta.clone(),
            center.get("lat").and_then(Value::as_f64),
            center.get("lon").and_then(Value::as_f64),
        );
    }

    let has_full_geometry = raw_members.map_or(false, |members| {
        members.iter().any(|member| {
            match member.get("type").and_then(Value::as_str) {
                Some("node") => member.get("lat").is_some(),
                Some("way") => member
                    .get("geometry")
                    .and_then(Value::as_array)
                    .map_or(false, |geometry| !geometry.is_empty()),
                _ => false,
            }
        })
    });

    let members = raw_members.map(|raw| {
        let mut members = Vec::with_capacity(raw.len());
        for raw_member in raw {
            let kind = match raw_member.get("type").and_then(Value::as_str) {
                Some(kind) => kind.to_string(),
                None => continue,
            };
            let mut ref_id = match raw_member.get("ref").and_then(OsmId::from_json) {
                Some(ref_id) => ref_id,
                None => continue,
            };
            let role = raw_member
                .get("role")
                .and_then(Value::as_str)
                .map(str::to_string);
            if has_full_geometry {
                match kind.as_str() {
                    "node" => {
                        let lat = raw_member.get("lat").and_then(Value::as_f64);
                        let lon = raw_member.get("lon").and_then(Value::as_f64);
                        if let (Some(lat), Some(lon)) = (lat, lon) {
                            parsed.add_full_geometry_node(ref_id.clone(), lat, lon);
                        }
                    }
                    "way" => {
                        if let Some(geometry) =
                            raw_member.get("geometry").and_then(Value::as_array)
                        {
                            let node_ids: Vec<OsmId> =
                                geometry.iter().map(coordinate_ref).collect();
                            for entry in geometry {
                                let lat = entry.get("lat").and_then(Value::as_f64);
                                let lon = entry.get("lon").and_then(Value::as_f64);
                                if let (Some(lat), Some(lon)) = (lat, lon) {
                                    parsed.add_full_geometry_node(
                                        coordinate_ref(entry),
                                        lat,
                                        lon,
                                    );
                                }
                            }
                            ref_id = OsmId::Str(format!("{}{}", FULL_GEOM_PREFIX, ref_id));
                            parsed.add_full_geometry_way(ref_id.clone(), node_ids);
                        }
                    }
                    _ => {}
                }
            }
            members.push(Member { kind, ref_id, role });
        }
        members
    });

    if !has_full_geometry {
        if let Some(bounds) = bounds_of(object) {
            parsed.add_bounds_placeholder(
                ElementKind::Relation,
                &id,
                tags.clone(),
                meta.clone(),
                bounds,
            );
        }
    }

    parsed.relations.push(Relation {
        id,
        tags,
        meta,
        members,
    });
}

/// Node ref for an inline geometry entry. Entries without coordinates
/// (Overpass emits JSON nulls for clipped vertices) get a ref that never
/// resolves, tainting the feature downstream.
fn coordinate_ref(entry: &Value) -> OsmId {
    match (entry.get("lat"), entry.get("lon")) {
        (Some(lat), Some(lon)) if !lat.is_null() && !lon.is_null() => {
            anonymous_node_id(&coordinate_text(lat), &coordinate_text(lon))
        }
        _ => OsmId::Str(UNKNOWN_LOCATION_ID.to_string()),
    }
}

fn coordinate_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn tags_of(object: &Map<String, Value>) -> Tags {
    let mut tags = Tags::new();
    if let Some(raw) = object.get("tags").and_then(Value::as_object) {
        for (key, value) in raw {
            tags.insert(key.clone(), coordinate_text(value));
        }
    }
    tags
}

fn bounds_of(object: &Map<String, Value>) -> Option<Bounds> {
    let bounds = object.get("bounds")?.as_object()?;
    Some(Bounds {
        minlat: bounds.get("minlat")?.as_f64()?,
        minlon: bounds.get("minlon")?.as_f64()?,
        maxlat: bounds.get("maxlat")?.as_f64()?,
        maxlon: bounds.get("maxlon")?.as_f64()?,
    })
}

fn meta_of(object: &Map<String, Value>) -> Meta {
    Meta {
        timestamp: object.get("timestamp").cloned(),
        version: object.get("version").cloned(),
        changeset: object.get("changeset").cloned(),
        user: object.get("user").cloned(),
        uid: object.get("uid").cloned(),
    }
}

#[test]
fn parses_bare_arrays_and_response_objects() {
    let from_array = parse(r#"[{"type":"node","id":1,"lat":1.0,"lon":2.0}]"#).unwrap();
    let from_object =
        parse(r#"{"elements":[{"type":"node","id":1,"lat":1.0,"lon":2.0}]}"#).unwrap();
    assert_eq!(from_array.nodes.len(), 1);
    assert_eq!(from_object.nodes.len(), 1);
    assert_eq!(from_array.nodes[0].id, OsmId::Int(1));
    assert_eq!(from_array.nodes[0].lat, Some(1.0));
    assert_eq!(from_array.nodes[0].lon, Some(2.0));
}

#[test]
fn rejects_documents_without_elements() {
    assert!(parse("not json").is_err());
    assert!(parse(r#"{"foo": "bar"}"#).is_err());
    assert!(parse("42").is_err());
}

#[test]
fn way_full_geometry_synthesizes_anonymous_nodes() {
    let parsed = parse(
        r#"[{
            "type": "way", "id": 1,
            "tags": {"highway": "residential"},
            "geometry": [
                {"lat": 1.0, "lon": 2.0},
                {"lat": 3.0, "lon": 4.0}
            ]
        }]"#,
    )
    .unwrap();
    assert_eq!(parsed.ways.len(), 1);
    assert_eq!(
        parsed.ways[0].nodes,
        vec![
            OsmId::Str("_anonymous@1.0/2.0".to_string()),
            OsmId::Str("_anonymous@3.0/4.0".to_string()),
        ]
    );
    assert_eq!(parsed.nodes.len(), 2);
    assert_eq!(parsed.nodes[1].lat, Some(3.0));
}

#[test]
fn relation_full_geometry_renames_way_members() {
    let parsed = parse(
        r#"[{
            "type": "relation", "id": 5,
            "tags": {"type": "multipolygon"},
            "members": [{
                "type": "way", "ref": 9, "role": "outer",
                "geometry": [
                    {"lat": 0.0, "lon": 0.0},
                    {"lat": 0.0, "lon": 1.0},
                    {"lat": 1.0, "lon": 1.0},
                    {"lat": 0.0, "lon": 0.0}
                ]
            }]
        }]"#,
    )
    .unwrap();
    let members = parsed.relations[0].members.as_ref().unwrap();
    assert_eq!(members[0].ref_id, OsmId::Str("_fullGeom9".to_string()));
    assert_eq!(parsed.ways.len(), 1);
    assert_eq!(parsed.ways[0].id, OsmId::Str("_fullGeom9".to_string()));
    assert_eq!(parsed.ways[0].nodes.len(), 4);
    assert_eq!(parsed.nodes.len(), 4);
}

#[test]
fn center_and_bounds_expand_to_placeholders() {
    let parsed = parse(
        r#"[
            {"type": "way", "id": 1, "tags": {"amenity": "parking"},
             "center": {"lat": 2.5, "lon": 3.5}},
            {"type": "way", "id": 2, "tags": {"building": "yes"},
             "bounds": {"minlat": 0.0, "minlon": 0.0, "maxlat": 1.0, "maxlon": 1.0}}
        ]"#,
    )
    .unwrap();
    let center = &parsed.nodes[0];
    assert!(center.is_center_placeholder);
    assert_eq!(center.kind, ElementKind::Way);
    assert_eq!(center.id, OsmId::Int(1));
    assert_eq!(center.lat, Some(2.5));
    let bounds_way = parsed
        .ways
        .iter()
        .find(|way| way.is_bounds_placeholder)
        .unwrap();
    assert_eq!(bounds_way.id, OsmId::Int(2));
    assert_eq!(bounds_way.nodes.len(), 5);
}

#[test]
fn clipped_geometry_vertices_become_unresolvable_refs() {
    let parsed = parse(
        r#"[{
            "type": "way", "id": 1,
            "geometry": [null, {"lat": 1.0, "lon": 2.0}]
        }]"#,
    )
    .unwrap();
    assert_eq!(
        parsed.ways[0].nodes[0],
        OsmId::Str(UNKNOWN_LOCATION_ID.to_string())
    );
    assert_eq!(parsed.nodes.len(), 1);
}
