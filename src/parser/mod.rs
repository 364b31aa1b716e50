use std::collections::HashSet;

use crate::element::{ElementKind, Meta, Node, OsmId, Relation, Tags, Way};

pub mod osm_xml;
pub mod overpass_json;

pub(crate) const UNKNOWN_LOCATION_ID: &str = "_anonymous@unknown_location";

/// Raw elements in document order, pseudo-elements from `center`, `bounds`
/// and full-geometry output already expanded.
#[derive(Default)]
pub struct Parsed {
    pub nodes: Vec<Node>,
    pub ways: Vec<Way>,
    pub relations: Vec<Relation>,
    synthesized_way_ids: HashSet<OsmId>,
}

impl Parsed {
    pub(crate) fn new() -> Parsed {
        Parsed::default()
    }

    /// Synthetic centroid node standing in for a way or relation that was
    /// downloaded with `out center`. It keeps the source element's identity.
    pub(crate) fn add_center_placeholder(
        &mut self,
        kind: ElementKind,
        id: OsmId,
        tags: Tags,
        meta: Meta,
        lat: Option<f64>,
        lon: Option<f64>,
    ) {
        self.nodes.push(Node {
            kind,
            id,
            lat,
            lon,
            tags,
            meta,
            is_center_placeholder: true,
        });
    }

    /// Synthetic closed pseudo-way tracing the element's bounding box.
    pub(crate) fn add_bounds_placeholder(
        &mut self,
        kind: ElementKind,
        id: &OsmId,
        tags: Tags,
        meta: Meta,
        bounds: Bounds,
    ) {
        let corners = [
            (bounds.minlat, bounds.minlon),
            (bounds.maxlat, bounds.minlon),
            (bounds.maxlat, bounds.maxlon),
            (bounds.minlat, bounds.maxlon),
        ];
        let mut node_ids = Vec::with_capacity(5);
        for (index, (lat, lon)) in corners.into_iter().enumerate() {
            let node_id = OsmId::Str(format!("_way/{}bounds{}", id, index + 1));
            self.nodes.push(Node {
                kind: ElementKind::Node,
                id: node_id.clone(),
                lat: Some(lat),
                lon: Some(lon),
                tags: Tags::new(),
                meta: Meta::default(),
                is_center_placeholder: false,
            });
            node_ids.push(node_id);
        }
        node_ids.push(node_ids[0].clone());
        self.ways.push(Way {
            kind,
            id: id.clone(),
            nodes: node_ids,
            tags,
            meta,
            is_bounds_placeholder: true,
        });
    }

    /// Coordinate-only node synthesized from inline full geometry.
    pub(crate) fn add_full_geometry_node(&mut self, id: OsmId, lat: f64, lon: f64) {
        self.nodes.push(Node {
            kind: ElementKind::Node,
            id,
            lat: Some(lat),
            lon: Some(lon),
            tags: Tags::new(),
            meta: Meta::default(),
            is_center_placeholder: false,
        });
    }

    /// Skeleton way synthesized for a relation member carrying inline
    /// geometry. Ways shared between relations are synthesized once, so
    /// deduplication does not double their node lists.
    pub(crate) fn add_full_geometry_way(&mut self, id: OsmId, nodes: Vec<OsmId>) {
        if !self.synthesized_way_ids.insert(id.clone()) {
            return;
        }
        self.ways.push(Way {
            kind: ElementKind::Way,
            id,
            nodes,
            tags: Tags::new(),
            meta: Meta::default(),
            is_bounds_placeholder: false,
        });
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Bounds {
    pub minlat: f64,
    pub minlon: f64,
    pub maxlat: f64,
    pub maxlon: f64,
}

/// Id for a coordinate-only node, derived from the source text of its
/// coordinates so both parsers produce identical ids.
pub(crate) fn anonymous_node_id(lat: &str, lon: &str) -> OsmId {
    OsmId::Str(format!("_anonymous@{}/{}", lat, lon))
}

#[test]
fn bounds_placeholder_traces_a_closed_ring() {
    let mut parsed = Parsed::new();
    parsed.add_bounds_placeholder(
        ElementKind::Way,
        &OsmId::Int(7),
        Tags::new(),
        Meta::default(),
        Bounds {
            minlat: 1.0,
            minlon: 2.0,
            maxlat: 3.0,
            maxlon: 4.0,
        },
    );
    assert_eq!(parsed.nodes.len(), 4);
    assert_eq!(parsed.ways.len(), 1);
    let way = &parsed.ways[0];
    assert!(way.is_bounds_placeholder);
    assert_eq!(way.nodes.len(), 5);
    assert_eq!(way.nodes.first(), way.nodes.last());
    assert_eq!(way.nodes[0], OsmId::Str("_way/7bounds1".to_string()));
    assert_eq!(parsed.nodes[0].lat, Some(1.0));
    assert_eq!(parsed.nodes[0].lon, Some(2.0));
    assert_eq!(parsed.nodes[2].lat, Some(3.0));
    assert_eq!(parsed.nodes[2].lon, Some(4.0));
}

#[test]
fn shared_full_geometry_ways_are_synthesized_once() {
    let mut parsed = Parsed::new();
    let id = OsmId::Str("_fullGeom9".to_string());
    parsed.add_full_geometry_way(id.clone(), vec![OsmId::Int(1), OsmId::Int(2)]);
    parsed.add_full_geometry_way(id, vec![OsmId::Int(1), OsmId::Int(2)]);
    assert_eq!(parsed.ways.len(), 1);
}
