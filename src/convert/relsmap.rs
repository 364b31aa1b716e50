//! Back-index from member element ids to the relations referencing them,
//! used to fill `properties.relations` on every feature.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::element::{tags_to_json, OsmId, Tags};

pub(crate) struct RelsmapEntry {
    pub role: Option<String>,
    pub rel: OsmId,
    pub reltags: Tags,
}

impl RelsmapEntry {
    fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert(
            "role".to_string(),
            match &self.role {
                Some(role) => Value::from(role.clone()),
                None => Value::Null,
            },
        );
        object.insert("rel".to_string(), self.rel.to_json());
        object.insert("reltags".to_string(), tags_to_json(&self.reltags));
        Value::Object(object)
    }
}

#[derive(Default)]
pub(crate) struct Relsmap {
    node: HashMap<OsmId, Vec<RelsmapEntry>>,
    way: HashMap<OsmId, Vec<RelsmapEntry>>,
    relation: HashMap<OsmId, Vec<RelsmapEntry>>,
}

impl Relsmap {
    /// Records a membership. Full-geometry refs are keyed by their stripped
    /// id so lookups with output ids succeed.
    pub fn add(&mut self, member_kind: &str, ref_id: &OsmId, entry: RelsmapEntry) -> bool {
        let table = match member_kind {
            "node" => &mut self.node,
            "way" => &mut self.way,
            "relation" => &mut self.relation,
            _ => return false,
        };
        table
            .entry(ref_id.strip_full_geom())
            .or_default()
            .push(entry);
        true
    }

    /// Memberships of the element, as the JSON array stored in
    /// `properties.relations`.
    pub fn memberships(&self, member_kind: &str, id: &OsmId) -> Value {
        let table = match member_kind {
            "node" => &self.node,
            "way" => &self.way,
            "relation" => &self.relation,
            _ => return Value::Array(Vec::new()),
        };
        let entries = match table.get(id) {
            Some(entries) => entries.as_slice(),
            None => &[],
        };
        Value::Array(entries.iter().map(RelsmapEntry::to_json).collect())
    }
}

#[test]
fn memberships_are_keyed_by_stripped_ids() {
    let mut relsmap = Relsmap::default();
    let added = relsmap.add(
        "way",
        &OsmId::Str("_fullGeom9".to_string()),
        RelsmapEntry {
            role: Some("outer".to_string()),
            rel: OsmId::Int(5),
            reltags: Tags::new(),
        },
    );
    assert!(added);
    let memberships = relsmap.memberships("way", &OsmId::Int(9));
    assert_eq!(memberships[0]["rel"], Value::from(5));
    assert_eq!(memberships[0]["role"], Value::from("outer"));
    assert!(!relsmap.add("area", &OsmId::Int(1), RelsmapEntry {
        role: None,
        rel: OsmId::Int(5),
        reltags: Tags::new(),
    }));
}
