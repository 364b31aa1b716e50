use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

/// OSM tags. A sorted map keeps serialized output stable.
pub type Tags = BTreeMap<String, String>;

pub const FULL_GEOM_PREFIX: &str = "_fullGeom";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Node => "node",
            ElementKind::Way => "way",
            ElementKind::Relation => "relation",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Element id. Real OSM ids are integers, but synthesized elements
/// (anonymous full-geometry nodes, bounds corners, renamed full-geometry
/// ways) carry string ids.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OsmId {
    Int(i64),
    Str(String),
}

impl OsmId {
    pub fn parse(text: &str) -> OsmId {
        match text.parse::<i64>() {
            Ok(number) => OsmId::Int(number),
            Err(_) => OsmId::Str(text.to_string()),
        }
    }

    pub fn from_json(value: &Value) -> Option<OsmId> {
        match value {
            Value::Number(number) => match number.as_i64() {
                Some(int) => Some(OsmId::Int(int)),
                None => Some(OsmId::Str(number.to_string())),
            },
            Value::String(text) => Some(OsmId::parse(text)),
            _ => None,
        }
    }

    /// Strips the full-geometry marker prefix, re-parsing the remainder so
    /// renamed numeric ids turn back into numbers.
    pub fn strip_full_geom(&self) -> OsmId {
        match self {
            OsmId::Str(text) if text.starts_with(FULL_GEOM_PREFIX) => {
                OsmId::parse(&text[FULL_GEOM_PREFIX.len()..])
            }
            other => other.clone(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            OsmId::Int(number) => Value::from(*number),
            OsmId::Str(text) => Value::from(text.clone()),
        }
    }
}

impl fmt::Display for OsmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsmId::Int(number) => write!(f, "{}", number),
            OsmId::Str(text) => f.write_str(text),
        }
    }
}

/// Authorship metadata, copied verbatim from the input document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Meta {
    pub timestamp: Option<Value>,
    pub version: Option<Value>,
    pub changeset: Option<Value>,
    pub user: Option<Value>,
    pub uid: Option<Value>,
}

impl Meta {
    /// Version as a number, for deduplication. Anything unparseable counts
    /// as version 0.
    pub fn version_number(&self) -> f64 {
        match &self.version {
            Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
            Some(Value::String(text)) => text.parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        let fields = [
            ("timestamp", &self.timestamp),
            ("version", &self.version),
            ("changeset", &self.changeset),
            ("user", &self.user),
            ("uid", &self.uid),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                object.insert(key.to_string(), value.clone());
            }
        }
        Value::Object(object)
    }

    fn merged_with(self, later: Meta) -> Meta {
        Meta {
            timestamp: later.timestamp.or(self.timestamp),
            version: later.version.or(self.version),
            changeset: later.changeset.or(self.changeset),
            user: later.user.or(self.user),
            uid: later.uid.or(self.uid),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    /// Center placeholders retain the type of the element they stand in
    /// for, so this is not always `Node`.
    pub kind: ElementKind,
    pub id: OsmId,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub tags: Tags,
    pub meta: Meta,
    pub is_center_placeholder: bool,
}

impl Node {
    /// Merges two equal-version records. The later record overrides
    /// scalars, tag sets are unioned with the later record winning.
    pub fn merged_with(self, later: Node) -> Node {
        Node {
            kind: later.kind,
            id: later.id,
            lat: later.lat.or(self.lat),
            lon: later.lon.or(self.lon),
            tags: merge_tags(self.tags, later.tags),
            meta: self.meta.merged_with(later.meta),
            is_center_placeholder: self.is_center_placeholder || later.is_center_placeholder,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Way {
    /// Bounds placeholders retain the type of the element they stand in
    /// for, so this is not always `Way`.
    pub kind: ElementKind,
    pub id: OsmId,
    pub nodes: Vec<OsmId>,
    pub tags: Tags,
    pub meta: Meta,
    pub is_bounds_placeholder: bool,
}

impl Way {
    /// Merges two equal-version records; node lists are concatenated.
    pub fn merged_with(self, later: Way) -> Way {
        let mut nodes = self.nodes;
        nodes.extend(later.nodes);
        Way {
            kind: later.kind,
            id: later.id,
            nodes,
            tags: merge_tags(self.tags, later.tags),
            meta: self.meta.merged_with(later.meta),
            is_bounds_placeholder: self.is_bounds_placeholder || later.is_bounds_placeholder,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Member {
    pub kind: String,
    pub ref_id: OsmId,
    pub role: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Relation {
    pub id: OsmId,
    pub tags: Tags,
    pub meta: Meta,
    pub members: Option<Vec<Member>>,
}

impl Relation {
    /// Merges two equal-version records; member lists are concatenated.
    pub fn merged_with(self, later: Relation) -> Relation {
        let members = match (self.members, later.members) {
            (Some(mut first), Some(second)) => {
                first.extend(second);
                Some(first)
            }
            (first, second) => second.or(first),
        };
        Relation {
            id: later.id,
            tags: merge_tags(self.tags, later.tags),
            meta: self.meta.merged_with(later.meta),
            members,
        }
    }
}

fn merge_tags(first: Tags, second: Tags) -> Tags {
    let mut merged = first;
    merged.extend(second);
    merged
}

pub fn tags_to_json(tags: &Tags) -> Value {
    let mut object = Map::new();
    for (key, value) in tags {
        object.insert(key.clone(), Value::from(value.clone()));
    }
    Value::Object(object)
}

#[test]
fn osm_id_parses_numbers_and_keeps_synthetic_ids() {
    assert_eq!(OsmId::parse("42"), OsmId::Int(42));
    assert_eq!(OsmId::parse("-7"), OsmId::Int(-7));
    assert_eq!(
        OsmId::parse("_anonymous@1.5/2.5"),
        OsmId::Str("_anonymous@1.5/2.5".to_string())
    );
}

#[test]
fn strip_full_geom_restores_numeric_ids() {
    let renamed = OsmId::Str("_fullGeom123".to_string());
    assert_eq!(renamed.strip_full_geom(), OsmId::Int(123));
    assert_eq!(OsmId::Int(5).strip_full_geom(), OsmId::Int(5));
    let other = OsmId::Str("abc".to_string());
    assert_eq!(other.strip_full_geom(), other);
}

#[test]
fn merged_way_concatenates_nodes_and_unions_tags() {
    let first = Way {
        kind: ElementKind::Way,
        id: OsmId::Int(1),
        nodes: vec![OsmId::Int(1), OsmId::Int(2)],
        tags: Tags::from([
            ("foo".to_string(), "bar".to_string()),
            ("dupe".to_string(), "x".to_string()),
        ]),
        meta: Meta::default(),
        is_bounds_placeholder: false,
    };
    let second = Way {
        kind: ElementKind::Way,
        id: OsmId::Int(1),
        nodes: vec![OsmId::Int(3)],
        tags: Tags::from([("dupe".to_string(), "y".to_string())]),
        meta: Meta::default(),
        is_bounds_placeholder: false,
    };
    let merged = first.merged_with(second);
    assert_eq!(merged.nodes, vec![OsmId::Int(1), OsmId::Int(2), OsmId::Int(3)]);
    assert_eq!(merged.tags.get("foo").map(String::as_str), Some("bar"));
    assert_eq!(merged.tags.get("dupe").map(String::as_str), Some("y"));
}

#[test]
fn meta_version_number_handles_strings() {
    let meta = Meta {
        version: Some(Value::from("3")),
        ..Meta::default()
    };
    assert_eq!(meta.version_number(), 3.0);
    assert_eq!(Meta::default().version_number(), 0.0);
}
