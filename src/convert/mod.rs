use anyhow::Result;
use indexmap::IndexMap;
use log::warn;
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::element::{tags_to_json, Member, Meta, Node, OsmId, Relation, Tags, Way};
use crate::geojson::rewind::rewind;
use crate::geojson::{Feature, FeatureCollection, Geometry, Position};
use crate::options::{
    default_uninteresting_tags, DefaultDeduplicator, Deduplicator, PolygonFeatures,
    PolygonFeaturesValidator, PolygonRule, UninterestingTag, UninterestingTagsValidator,
};
use crate::parser::{osm_xml, overpass_json, Parsed};

mod join;
mod multipolygon;
mod relsmap;

use join::{is_closed, join_ways};
use multipolygon::{find_outer, LatLon};
use relsmap::{Relsmap, RelsmapEntry};

/// Converts OSM data into a GeoJSON `FeatureCollection`.
///
/// An instance holds only configuration; conversions never mutate it, so a
/// single converter can serve many documents.
///
/// ```
/// use osmtogeojson::OsmToGeoJson;
///
/// let converter = OsmToGeoJson::new();
/// let geojson = converter
///     .convert_overpass_json(
///         r#"[{"type": "node", "id": 1, "lat": 1.0, "lon": 2.0,
///              "tags": {"amenity": "cafe"}}]"#,
///         None,
///     )
///     .unwrap();
/// assert_eq!(geojson.features.len(), 1);
/// assert_eq!(geojson.features[0].id, "node/1");
/// ```
pub struct OsmToGeoJson {
    verbose: bool,
    flat_properties: bool,
    uninteresting_tags: Vec<UninterestingTag>,
    uninteresting_tags_validator: Option<Box<UninterestingTagsValidator>>,
    polygon_features: PolygonFeatures,
    polygon_features_validator: Option<Box<PolygonFeaturesValidator>>,
    deduplicator: Box<dyn Deduplicator>,
}

impl Default for OsmToGeoJson {
    fn default() -> Self {
        OsmToGeoJson {
            verbose: false,
            flat_properties: false,
            uninteresting_tags: default_uninteresting_tags(),
            uninteresting_tags_validator: None,
            polygon_features: PolygonFeatures::osm_defaults(),
            polygon_features_validator: None,
            deduplicator: Box::new(DefaultDeduplicator),
        }
    }
}

impl OsmToGeoJson {
    pub fn new() -> Self {
        OsmToGeoJson::default()
    }

    /// Emit `log::warn!` diagnostics for skipped and tainted elements.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Merge `meta`, `tags` and the feature id into a flat `properties`
    /// object instead of the nested layout.
    pub fn flat_properties(mut self, flat: bool) -> Self {
        self.flat_properties = flat;
        self
    }

    /// Replaces the tag rules deciding which elements are interesting
    /// enough to emit on their own.
    pub fn uninteresting_tags(mut self, tags: Vec<UninterestingTag>) -> Self {
        self.uninteresting_tags = tags;
        self
    }

    /// Replaces interestingness checking wholesale. The callback receives
    /// the tag set and the active ignore rules and returns true when the
    /// tags are uninteresting.
    pub fn uninteresting_tags_validator(mut self, validator: Box<UninterestingTagsValidator>) -> Self {
        self.uninteresting_tags_validator = Some(validator);
        self
    }

    /// Adds polygon detection rules on top of the default table; a rule
    /// replaces the default rule for the same key.
    pub fn additional_polygon_features(mut self, rules: Vec<PolygonRule>) -> Self {
        self.polygon_features.add_rules(&rules);
        self
    }

    /// Replaces polygon detection wholesale.
    pub fn polygon_features_validator(mut self, validator: Box<PolygonFeaturesValidator>) -> Self {
        self.polygon_features_validator = Some(validator);
        self
    }

    /// Replaces the strategy merging records that share an id.
    pub fn deduplicator(mut self, deduplicator: Box<dyn Deduplicator>) -> Self {
        self.deduplicator = deduplicator;
        self
    }

    /// Converts an Overpass API JSON document (bare element array or full
    /// response object). `sink` is invoked once per feature as it is
    /// assembled, before winding normalization and property flattening;
    /// the returned collection receives both passes.
    pub fn convert_overpass_json(
        &self,
        data: &str,
        sink: Option<&mut (dyn FnMut(&Feature) + '_)>,
    ) -> Result<FeatureCollection> {
        Ok(self.convert(overpass_json::parse(data)?, sink))
    }

    /// Converts an OSM XML document. See [`Self::convert_overpass_json`]
    /// for the `sink` contract.
    pub fn convert_osm_xml(
        &self,
        data: &str,
        sink: Option<&mut (dyn FnMut(&Feature) + '_)>,
    ) -> Result<FeatureCollection> {
        Ok(self.convert(osm_xml::parse(data)?, sink))
    }

    fn convert(
        &self,
        parsed: Parsed,
        mut sink: Option<&mut (dyn FnMut(&Feature) + '_)>,
    ) -> FeatureCollection {
        let working = self.deduplicate(parsed);
        let relsmap = self.build_relsmap(&working.relations);
        let mut skippable = HashSet::new();

        let (mut polygons, mut lines) =
            self.build_relation_features(&working, &relsmap, &mut skippable, sink.as_deref_mut());
        let (way_polygons, way_lines) =
            self.build_way_features(&working, &relsmap, &skippable, sink.as_deref_mut());
        polygons.extend(way_polygons);
        lines.extend(way_lines);
        let points = self.build_point_features(&working, &relsmap, sink.as_deref_mut());

        let mut features = polygons;
        features.extend(lines);
        features.extend(points);
        if self.flat_properties {
            for feature in &mut features {
                flatten_properties(feature);
            }
        }
        let mut collection = FeatureCollection::new(features);
        rewind(&mut collection);
        collection
    }

    fn warn(&self, message: &str) {
        if self.verbose {
            warn!("{}", message);
        }
    }

    fn has_interesting_tags(&self, tags: &Tags, ignore: &[UninterestingTag]) -> bool {
        if let Some(validator) = &self.uninteresting_tags_validator {
            return !validator(tags, ignore);
        }
        tags.iter().any(|(key, value)| {
            !self
                .uninteresting_tags
                .iter()
                .any(|rule| rule.matches(key, value))
                && !ignore.iter().any(|rule| rule.matches(key, value))
        })
    }

    fn is_area(&self, tags: &Tags) -> bool {
        match &self.polygon_features_validator {
            Some(validator) => validator(tags),
            None => self.polygon_features.is_polygon_feature(tags),
        }
    }

    fn deduplicate(&self, parsed: Parsed) -> Working {
        let mut working = Working::default();

        // Relation node members stay standalone even when ways reference
        // them.
        for relation in &parsed.relations {
            if let Some(members) = &relation.members {
                for member in members {
                    if member.kind == "node" {
                        working.poi_node_ids.insert(member.ref_id.clone());
                    }
                }
            }
        }

        for node in parsed.nodes {
            let id = node.id.clone();
            let merged = match working.nodes.get(&id) {
                Some(existing) => self.deduplicator.deduplicate_node(existing.clone(), node),
                None => node,
            };
            if self.has_interesting_tags(&merged.tags, &[]) {
                working.poi_node_ids.insert(id.clone());
            }
            working.nodes.insert(id, merged);
        }

        for way in parsed.ways {
            let id = way.id.clone();
            for node_id in &way.nodes {
                working.way_node_ids.insert(node_id.clone());
            }
            let merged = match working.ways.get(&id) {
                Some(existing) => self.deduplicator.deduplicate_way(existing.clone(), way),
                None => way,
            };
            working.ways.insert(id, merged);
        }

        for relation in parsed.relations {
            let id = relation.id.clone();
            let merged = match working.relations.get(&id) {
                Some(existing) => self
                    .deduplicator
                    .deduplicate_relation(existing.clone(), relation),
                None => relation,
            };
            working.relations.insert(id, merged);
        }

        working
    }

    fn build_relsmap(&self, relations: &IndexMap<OsmId, Relation>) -> Relsmap {
        let mut relsmap = Relsmap::default();
        for (id, relation) in relations {
            let members = match &relation.members {
                Some(members) => members,
                None => {
                    self.warn(&format!(
                        "Relation relation/{} ignored because it has no members",
                        id
                    ));
                    continue;
                }
            };
            for member in members {
                let entry = RelsmapEntry {
                    role: member.role.clone(),
                    rel: id.clone(),
                    reltags: relation.tags.clone(),
                };
                if !relsmap.add(&member.kind, &member.ref_id, entry) {
                    self.warn(&format!(
                        "Relation relation/{} member {}/{} ignored because it has an invalid type",
                        id, member.kind, member.ref_id
                    ));
                }
            }
        }
        relsmap
    }

    fn build_point_features(
        &self,
        working: &Working,
        relsmap: &Relsmap,
        mut sink: Option<&mut (dyn FnMut(&Feature) + '_)>,
    ) -> Vec<Feature> {
        let mut points = Vec::new();
        for (id, node) in &working.nodes {
            let interesting = self.has_interesting_tags(&node.tags, &[]);
            let standalone = interesting
                && (!working.way_node_ids.contains(id) || working.poi_node_ids.contains(id));
            if !standalone {
                continue;
            }
            let (lat, lon) = match (node.lat, node.lon) {
                (Some(lat), Some(lon)) => (lat, lon),
                _ => {
                    self.warn(&format!(
                        "POI {}/{} ignored because it lacks coordinates",
                        node.kind, id
                    ));
                    continue;
                }
            };
            let mut properties = feature_properties(
                node.kind.as_str(),
                id,
                &node.tags,
                &node.meta,
                relsmap.memberships("node", id),
            );
            if node.is_center_placeholder {
                properties.insert("geometry".to_string(), Value::from("center"));
            }
            let feature = Feature::new(
                format!("{}/{}", node.kind, id),
                properties,
                Geometry::Point([lon, lat]),
            );
            emit(sink.as_deref_mut(), &feature);
            points.push(feature);
        }
        points
    }

    fn build_relation_features(
        &self,
        working: &Working,
        relsmap: &Relsmap,
        skippable: &mut HashSet<OsmId>,
        mut sink: Option<&mut (dyn FnMut(&Feature) + '_)>,
    ) -> (Vec<Feature>, Vec<Feature>) {
        let mut polygons = Vec::new();
        let mut lines = Vec::new();
        for (rel_id, relation) in &working.relations {
            match relation.tags.get("type").map(String::as_str) {
                Some("route") | Some("waterway") => {
                    let members = match &relation.members {
                        Some(members) => members,
                        None => continue, // warned while building the relsmap
                    };
                    for member in members.iter().filter(|member| member.kind == "way") {
                        if let Some(way) = working.ways.get(&member.ref_id) {
                            if !self.has_interesting_tags(&way.tags, &[]) {
                                skippable.insert(way.id.clone());
                            }
                        }
                    }
                    match self.construct_multi_line_string(working, relsmap, relation, rel_id) {
                        Some(feature) => {
                            emit(sink.as_deref_mut(), &feature);
                            lines.push(feature);
                        }
                        None => self.warn(&format!(
                            "Route relation/{} ignored because it has invalid geometry",
                            rel_id
                        )),
                    }
                }
                Some("multipolygon") | Some("boundary") => {
                    if let Some(feature) =
                        self.build_multipolygon_feature(working, relsmap, relation, rel_id, skippable)
                    {
                        emit(sink.as_deref_mut(), &feature);
                        polygons.push(feature);
                    }
                }
                _ => {}
            }
        }
        (polygons, lines)
    }

    fn construct_multi_line_string(
        &self,
        working: &Working,
        relsmap: &Relsmap,
        relation: &Relation,
        rel_id: &OsmId,
    ) -> Option<Feature> {
        let members = relation.members.as_deref().unwrap_or_default();
        let mut tainted = false;
        let mut fragments: Vec<Vec<OsmId>> = Vec::new();
        for member in members.iter().filter(|member| member.kind == "way") {
            let way = working
                .ways
                .get(&member.ref_id)
                .filter(|way| !way.nodes.is_empty());
            let way = match way {
                Some(way) => way,
                None => {
                    self.warn(&format!(
                        "Route relation/{} tainted by a missing or incomplete way way/{}",
                        rel_id,
                        member.ref_id.strip_full_geom()
                    ));
                    tainted = true;
                    continue;
                }
            };
            let mut fragment = Vec::with_capacity(way.nodes.len());
            for node_id in &way.nodes {
                if position_of(&working.nodes, node_id).is_some() {
                    fragment.push(node_id.clone());
                } else {
                    tainted = true;
                }
            }
            fragments.push(fragment);
        }

        let chains = join_ways(fragments);
        let mut coordinates: Vec<Vec<Position>> = chains
            .iter()
            .map(|chain| {
                chain
                    .iter()
                    .filter_map(|id| position_of(&working.nodes, id))
                    .collect()
            })
            .collect();
        coordinates.retain(|chain| !chain.is_empty());
        if coordinates.is_empty() {
            return None;
        }
        let geometry = if coordinates.len() == 1 {
            Geometry::LineString(coordinates.remove(0))
        } else {
            Geometry::MultiLineString(coordinates)
        };
        let mut properties = feature_properties(
            "relation",
            rel_id,
            &relation.tags,
            &relation.meta,
            relsmap.memberships("relation", rel_id),
        );
        if tainted {
            self.warn(&format!(
                "Route relation/{} is tainted by an invalid node",
                rel_id
            ));
            properties.insert("tainted".to_string(), Value::Bool(true));
        }
        Some(Feature::new(
            format!("relation/{}", rel_id),
            properties,
            geometry,
        ))
    }

    fn build_multipolygon_feature(
        &self,
        working: &Working,
        relsmap: &Relsmap,
        relation: &Relation,
        rel_id: &OsmId,
        skippable: &mut HashSet<OsmId>,
    ) -> Option<Feature> {
        let members = match &relation.members {
            Some(members) => members,
            None => return None, // warned while building the relsmap
        };
        let mut outer_count = 0;
        for member in members {
            match member_role(member) {
                "outer" => outer_count += 1,
                "inner" => {}
                other => self.warn(&format!(
                    "Multipolygon relation/{} member {}/{} ignored because it has an invalid role: \"{}\"",
                    rel_id,
                    member.kind,
                    member.ref_id.strip_full_geom(),
                    other
                )),
            }
        }
        for member in members.iter().filter(|member| member.kind == "way") {
            if let Some(way) = working.ways.get(&member.ref_id) {
                let suppress = match member_role(member) {
                    "outer" => !self.has_interesting_tags(&way.tags, &tag_ignores(&relation.tags)),
                    "inner" => !self.has_interesting_tags(&way.tags, &[]),
                    _ => false,
                };
                if suppress {
                    skippable.insert(way.id.clone());
                }
            }
        }
        if outer_count == 0 {
            self.warn(&format!(
                "Multipolygon relation/{} ignored because it has no outer ways",
                rel_id
            ));
            return None;
        }

        let simple = outer_count == 1
            && !self.has_interesting_tags(&relation.tags, &[UninterestingTag::key("type")]);
        let feature = if simple {
            // The relation only groups the rings; the outer way carries the
            // feature identity.
            let outer_way = members
                .iter()
                .find(|member| member_role(member) == "outer")
                .and_then(|member| working.ways.get(&member.ref_id));
            let way = match outer_way {
                Some(way) => way,
                None => {
                    self.warn(&format!(
                        "Multipolygon relation/{} ignored because its outer way is missing",
                        rel_id
                    ));
                    return None;
                }
            };
            skippable.insert(way.id.clone());
            let identity = FeatureIdentity {
                kind: way.kind.as_str(),
                id: &way.id,
                tags: &way.tags,
                meta: &way.meta,
            };
            self.construct_multipolygon(working, relsmap, identity, relation)
        } else {
            let identity = FeatureIdentity {
                kind: "relation",
                id: rel_id,
                tags: &relation.tags,
                meta: &relation.meta,
            };
            self.construct_multipolygon(working, relsmap, identity, relation)
        };
        if feature.is_none() {
            self.warn(&format!(
                "Multipolygon relation/{} ignored because it has invalid geometry",
                rel_id
            ));
        }
        feature
    }

    fn construct_multipolygon(
        &self,
        working: &Working,
        relsmap: &Relsmap,
        identity: FeatureIdentity,
        relation: &Relation,
    ) -> Option<Feature> {
        let output_id = identity.id.strip_full_geom();
        let scope = format!("{}/{}", identity.kind, output_id);
        let mut tainted = false;
        let mut outer_fragments: Vec<Vec<OsmId>> = Vec::new();
        let mut inner_fragments: Vec<Vec<OsmId>> = Vec::new();
        let members = relation.members.as_deref().unwrap_or_default();
        for member in members.iter().filter(|member| member.kind == "way") {
            let role = member_role(member);
            if role != "outer" && role != "inner" {
                continue;
            }
            let way = working
                .ways
                .get(&member.ref_id)
                .filter(|way| !way.nodes.is_empty());
            let way = match way {
                Some(way) => way,
                None => {
                    self.warn(&format!(
                        "Multipolygon {} tainted by a missing or incomplete way way/{}",
                        scope,
                        member.ref_id.strip_full_geom()
                    ));
                    tainted = true;
                    continue;
                }
            };
            let mut fragment = Vec::with_capacity(way.nodes.len());
            let mut dropped = false;
            for node_id in &way.nodes {
                if latlon_of(&working.nodes, node_id).is_some() {
                    fragment.push(node_id.clone());
                } else {
                    dropped = true;
                }
            }
            if dropped {
                self.warn(&format!(
                    "Multipolygon {} tainted by way way/{} with a missing node",
                    scope,
                    way.id.strip_full_geom()
                ));
                tainted = true;
            }
            if role == "outer" {
                outer_fragments.push(fragment);
            } else {
                inner_fragments.push(fragment);
            }
        }

        let to_latlon = |ring: &Vec<OsmId>| -> Vec<LatLon> {
            ring.iter()
                .filter_map(|id| latlon_of(&working.nodes, id))
                .collect()
        };
        let mut clusters: Vec<Vec<Vec<LatLon>>> = join_ways(outer_fragments)
            .iter()
            .map(|ring| vec![to_latlon(ring)])
            .collect();
        for ring in &join_ways(inner_fragments) {
            let coordinates = to_latlon(ring);
            match find_outer(&clusters, &coordinates) {
                Some(index) => clusters[index].push(coordinates),
                None => self.warn(&format!(
                    "Multipolygon {} contains an inner ring with no containing outer ring",
                    scope
                )),
            }
        }

        let mut polygons: Vec<Vec<Vec<Position>>> = Vec::new();
        for cluster in clusters {
            let mut rings: Vec<Vec<Position>> = Vec::new();
            for ring in cluster {
                if ring.len() < 4 {
                    self.warn(&format!(
                        "Multipolygon {} contains a ring with too few nodes",
                        scope
                    ));
                    continue;
                }
                rings.push(ring.iter().map(|point| [point[1], point[0]]).collect());
            }
            if rings.is_empty() {
                self.warn(&format!(
                    "Multipolygon {} contains an empty ring cluster",
                    scope
                ));
            } else {
                polygons.push(rings);
            }
        }
        if polygons.is_empty() {
            return None;
        }
        let geometry = if polygons.len() == 1 {
            Geometry::Polygon(polygons.remove(0))
        } else {
            Geometry::MultiPolygon(polygons)
        };
        let mut properties = feature_properties(
            identity.kind,
            &output_id,
            identity.tags,
            identity.meta,
            relsmap.memberships(identity.kind, &output_id),
        );
        if tainted {
            self.warn(&format!("Multipolygon {} is tainted", scope));
            properties.insert("tainted".to_string(), Value::Bool(true));
        }
        Some(Feature::new(
            format!("{}/{}", identity.kind, output_id),
            properties,
            geometry,
        ))
    }

    fn build_way_features(
        &self,
        working: &Working,
        relsmap: &Relsmap,
        skippable: &HashSet<OsmId>,
        mut sink: Option<&mut (dyn FnMut(&Feature) + '_)>,
    ) -> (Vec<Feature>, Vec<Feature>) {
        let mut polygons = Vec::new();
        let mut lines = Vec::new();
        for (way_id, way) in &working.ways {
            if way.nodes.is_empty() {
                self.warn(&format!(
                    "Way {}/{} ignored because it has no nodes",
                    way.kind,
                    way_id.strip_full_geom()
                ));
                continue;
            }
            if skippable.contains(way_id) {
                continue;
            }
            let output_id = way_id.strip_full_geom();
            let mut tainted = false;
            let mut coordinates = Vec::with_capacity(way.nodes.len());
            for node_id in &way.nodes {
                match position_of(&working.nodes, node_id) {
                    Some(position) => coordinates.push(position),
                    None => tainted = true,
                }
            }
            if coordinates.len() <= 1 {
                self.warn(&format!(
                    "Way {}/{} ignored because it contains too few nodes",
                    way.kind, output_id
                ));
                continue;
            }
            let closed = is_closed(&way.nodes)
                && way
                    .nodes
                    .first()
                    .map_or(false, |id| position_of(&working.nodes, id).is_some());
            let is_area = closed
                && ((!way.tags.is_empty() && self.is_area(&way.tags)) || way.is_bounds_placeholder);
            let geometry = if is_area {
                Geometry::Polygon(vec![coordinates])
            } else {
                Geometry::LineString(coordinates)
            };
            let mut properties = feature_properties(
                way.kind.as_str(),
                &output_id,
                &way.tags,
                &way.meta,
                relsmap.memberships("way", &output_id),
            );
            if tainted {
                self.warn(&format!(
                    "Way {}/{} is tainted by an invalid node",
                    way.kind, output_id
                ));
                properties.insert("tainted".to_string(), Value::Bool(true));
            }
            if way.is_bounds_placeholder {
                properties.insert("geometry".to_string(), Value::from("bounds"));
            }
            let feature = Feature::new(
                format!("{}/{}", way.kind, output_id),
                properties,
                geometry,
            );
            emit(sink.as_deref_mut(), &feature);
            if is_area {
                polygons.push(feature);
            } else {
                lines.push(feature);
            }
        }
        (polygons, lines)
    }
}

#[derive(Default)]
struct Working {
    nodes: IndexMap<OsmId, Node>,
    ways: IndexMap<OsmId, Way>,
    relations: IndexMap<OsmId, Relation>,
    poi_node_ids: HashSet<OsmId>,
    way_node_ids: HashSet<OsmId>,
}

struct FeatureIdentity<'a> {
    kind: &'a str,
    id: &'a OsmId,
    tags: &'a Tags,
    meta: &'a Meta,
}

fn emit(sink: Option<&mut (dyn FnMut(&Feature) + '_)>, feature: &Feature) {
    if let Some(callback) = sink {
        callback(feature);
    }
}

fn member_role(member: &Member) -> &str {
    match &member.role {
        Some(role) if !role.is_empty() => role,
        _ => "outer",
    }
}

fn tag_ignores(tags: &Tags) -> Vec<UninterestingTag> {
    tags.iter()
        .map(|(key, value)| UninterestingTag::key_value(key.clone(), value.clone()))
        .collect()
}

fn position_of(nodes: &IndexMap<OsmId, Node>, id: &OsmId) -> Option<Position> {
    let node = nodes.get(id)?;
    match (node.lat, node.lon) {
        (Some(lat), Some(lon)) => Some([lon, lat]),
        _ => None,
    }
}

fn latlon_of(nodes: &IndexMap<OsmId, Node>, id: &OsmId) -> Option<LatLon> {
    let node = nodes.get(id)?;
    match (node.lat, node.lon) {
        (Some(lat), Some(lon)) => Some([lat, lon]),
        _ => None,
    }
}

fn feature_properties(
    kind: &str,
    id: &OsmId,
    tags: &Tags,
    meta: &Meta,
    relations: Value,
) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("type".to_string(), Value::from(kind.to_string()));
    properties.insert("id".to_string(), id.to_json());
    properties.insert("tags".to_string(), tags_to_json(tags));
    properties.insert("relations".to_string(), relations);
    properties.insert("meta".to_string(), meta.to_json());
    properties
}

fn flatten_properties(feature: &mut Feature) {
    let properties = std::mem::take(&mut feature.properties);
    let mut flat = Map::new();
    if let Some(Value::Object(meta)) = properties.get("meta") {
        for (key, value) in meta {
            flat.insert(key.clone(), value.clone());
        }
    }
    if let Some(Value::Object(tags)) = properties.get("tags") {
        for (key, value) in tags {
            flat.insert(key.clone(), value.clone());
        }
    }
    flat.insert("id".to_string(), Value::from(feature.id.clone()));
    feature.properties = flat;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn convert(data: &str) -> FeatureCollection {
        OsmToGeoJson::new().convert_overpass_json(data, None).unwrap()
    }

    #[test]
    fn tagged_nodes_become_point_features() {
        let result = convert(
            r#"[{"type": "node", "id": 1, "lat": 1.0, "lon": 2.0,
                 "tags": {"amenity": "cafe"}, "version": 3, "user": "alice"}]"#,
        );
        assert_eq!(result.kind, "FeatureCollection");
        assert_eq!(result.features.len(), 1);
        let feature = &result.features[0];
        assert_eq!(feature.id, "node/1");
        assert_eq!(feature.geometry, Geometry::Point([2.0, 1.0]));
        assert_eq!(feature.properties["type"], json!("node"));
        assert_eq!(feature.properties["id"], json!(1));
        assert_eq!(feature.properties["tags"]["amenity"], json!("cafe"));
        assert_eq!(feature.properties["meta"]["version"], json!(3));
        assert_eq!(feature.properties["meta"]["user"], json!("alice"));
        assert_eq!(feature.properties["relations"], json!([]));
    }

    #[test]
    fn untagged_and_uninteresting_nodes_are_suppressed() {
        let result = convert(
            r#"[
                {"type": "node", "id": 1, "lat": 1.0, "lon": 2.0},
                {"type": "node", "id": 2, "lat": 1.0, "lon": 2.0,
                 "tags": {"created_by": "JOSM", "source": "survey"}}
            ]"#,
        );
        assert!(result.features.is_empty());
    }

    #[test]
    fn way_nodes_with_interesting_tags_stay_standalone() {
        let result = convert(
            r#"[
                {"type": "node", "id": 1, "lat": 0.0, "lon": 0.0,
                 "tags": {"highway": "crossing"}},
                {"type": "node", "id": 2, "lat": 0.0, "lon": 1.0},
                {"type": "way", "id": 10, "nodes": [1, 2],
                 "tags": {"highway": "residential"}}
            ]"#,
        );
        assert_eq!(result.features.len(), 2);
        assert_eq!(result.features[0].id, "way/10");
        assert_eq!(result.features[1].id, "node/1");
    }

    #[test]
    fn closed_building_way_becomes_a_polygon() {
        let result = convert(
            r#"[
                {"type": "node", "id": 1, "lat": 0.0, "lon": 0.0},
                {"type": "node", "id": 2, "lat": 0.0, "lon": 1.0},
                {"type": "node", "id": 3, "lat": 1.0, "lon": 1.0},
                {"type": "way", "id": 10, "nodes": [1, 2, 3, 1],
                 "tags": {"building": "yes"}}
            ]"#,
        );
        assert_eq!(result.features.len(), 1);
        match &result.features[0].geometry {
            Geometry::Polygon(rings) => {
                assert_eq!(rings.len(), 1);
                assert_eq!(rings[0].len(), 4);
                assert_eq!(rings[0].first(), rings[0].last());
            }
            other => panic!("unexpected geometry: {:?}", other),
        }
    }

    #[test]
    fn closed_ways_without_area_tags_stay_lines() {
        let result = convert(
            r#"[
                {"type": "node", "id": 1, "lat": 0.0, "lon": 0.0},
                {"type": "node", "id": 2, "lat": 0.0, "lon": 1.0},
                {"type": "node", "id": 3, "lat": 1.0, "lon": 1.0},
                {"type": "way", "id": 10, "nodes": [1, 2, 3, 1],
                 "tags": {"highway": "primary"}}
            ]"#,
        );
        assert!(matches!(
            result.features[0].geometry,
            Geometry::LineString(_)
        ));
    }

    #[test]
    fn features_are_ordered_polygons_lines_points() {
        let result = convert(
            r#"[
                {"type": "node", "id": 5, "lat": 9.0, "lon": 9.0,
                 "tags": {"amenity": "bench"}},
                {"type": "node", "id": 1, "lat": 0.0, "lon": 0.0},
                {"type": "node", "id": 2, "lat": 0.0, "lon": 1.0},
                {"type": "node", "id": 3, "lat": 1.0, "lon": 1.0},
                {"type": "way", "id": 20, "nodes": [1, 2],
                 "tags": {"highway": "residential"}},
                {"type": "way", "id": 21, "nodes": [1, 2, 3, 1],
                 "tags": {"building": "yes"}}
            ]"#,
        );
        let ids: Vec<&str> = result.features.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["way/21", "way/20", "node/5"]);
    }

    #[test]
    fn exterior_rings_are_rewound_counterclockwise() {
        // clockwise input ring
        let result = convert(
            r#"[
                {"type": "node", "id": 1, "lat": 0.0, "lon": 0.0},
                {"type": "node", "id": 2, "lat": 1.0, "lon": 0.0},
                {"type": "node", "id": 3, "lat": 1.0, "lon": 1.0},
                {"type": "node", "id": 4, "lat": 0.0, "lon": 1.0},
                {"type": "way", "id": 10, "nodes": [1, 2, 3, 4, 1],
                 "tags": {"building": "yes"}}
            ]"#,
        );
        match &result.features[0].geometry {
            Geometry::Polygon(rings) => {
                assert_eq!(
                    rings[0],
                    vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]
                );
            }
            other => panic!("unexpected geometry: {:?}", other),
        }
    }

    fn multipolygon_with_hole(extra_relation_tags: &str) -> String {
        format!(
            r#"[
                {{"type": "node", "id": 1, "lat": 0.0, "lon": 0.0}},
                {{"type": "node", "id": 2, "lat": 0.0, "lon": 3.0}},
                {{"type": "node", "id": 3, "lat": 3.0, "lon": 3.0}},
                {{"type": "node", "id": 4, "lat": 3.0, "lon": 0.0}},
                {{"type": "node", "id": 5, "lat": 1.0, "lon": 1.0}},
                {{"type": "node", "id": 6, "lat": 1.0, "lon": 2.0}},
                {{"type": "node", "id": 7, "lat": 2.0, "lon": 2.0}},
                {{"type": "node", "id": 8, "lat": 2.0, "lon": 1.0}},
                {{"type": "way", "id": 10, "nodes": [1, 2, 3, 4, 1]}},
                {{"type": "way", "id": 11, "nodes": [5, 6, 7, 8, 5]}},
                {{"type": "relation", "id": 30,
                  "tags": {{"type": "multipolygon"{}}},
                  "members": [
                      {{"type": "way", "ref": 10, "role": "outer"}},
                      {{"type": "way", "ref": 11, "role": "inner"}}
                  ]}}
            ]"#,
            extra_relation_tags
        )
    }

    #[test]
    fn multipolygon_with_hole_becomes_a_two_ring_polygon() {
        let result = convert(&multipolygon_with_hole(r#", "building": "yes""#));
        assert_eq!(result.features.len(), 1);
        let feature = &result.features[0];
        assert_eq!(feature.id, "relation/30");
        assert_eq!(feature.properties["tags"]["building"], json!("yes"));
        match &feature.geometry {
            Geometry::Polygon(rings) => {
                assert_eq!(rings.len(), 2);
                assert_eq!(rings[0].len(), 5);
                // hole wound clockwise
                assert_eq!(
                    rings[1],
                    vec![[1.0, 1.0], [1.0, 2.0], [2.0, 2.0], [2.0, 1.0], [1.0, 1.0]]
                );
            }
            other => panic!("unexpected geometry: {:?}", other),
        }
    }

    #[test]
    fn simple_multipolygons_take_the_outer_way_identity() {
        let result = convert(
            r#"[
                {"type": "node", "id": 1, "lat": 0.0, "lon": 0.0},
                {"type": "node", "id": 2, "lat": 0.0, "lon": 3.0},
                {"type": "node", "id": 3, "lat": 3.0, "lon": 3.0},
                {"type": "way", "id": 10, "nodes": [1, 2, 3, 1],
                 "tags": {"building": "yes"}},
                {"type": "relation", "id": 40,
                 "tags": {"type": "multipolygon"},
                 "members": [{"type": "way", "ref": 10, "role": "outer"}]}
            ]"#,
        );
        assert_eq!(result.features.len(), 1);
        let feature = &result.features[0];
        assert_eq!(feature.id, "way/10");
        assert_eq!(feature.properties["type"], json!("way"));
        assert_eq!(feature.properties["id"], json!(10));
        assert_eq!(feature.properties["relations"][0]["rel"], json!(40));
        assert_eq!(feature.properties["relations"][0]["role"], json!("outer"));
        assert!(matches!(feature.geometry, Geometry::Polygon(_)));
    }

    #[test]
    fn orphan_inner_rings_are_dropped() {
        let result = convert(
            r#"[
                {"type": "node", "id": 1, "lat": 0.0, "lon": 0.0},
                {"type": "node", "id": 2, "lat": 0.0, "lon": 3.0},
                {"type": "node", "id": 3, "lat": 3.0, "lon": 3.0},
                {"type": "node", "id": 5, "lat": 10.0, "lon": 10.0},
                {"type": "node", "id": 6, "lat": 10.0, "lon": 11.0},
                {"type": "node", "id": 7, "lat": 11.0, "lon": 11.0},
                {"type": "way", "id": 10, "nodes": [1, 2, 3, 1]},
                {"type": "way", "id": 11, "nodes": [5, 6, 7, 5]},
                {"type": "relation", "id": 30,
                 "tags": {"type": "multipolygon", "natural": "water"},
                 "members": [
                     {"type": "way", "ref": 10, "role": "outer"},
                     {"type": "way", "ref": 11, "role": "inner"}
                 ]}
            ]"#,
        );
        assert_eq!(result.features.len(), 1);
        match &result.features[0].geometry {
            Geometry::Polygon(rings) => assert_eq!(rings.len(), 1),
            other => panic!("unexpected geometry: {:?}", other),
        }
    }

    #[test]
    fn relations_without_usable_members_yield_no_features() {
        let result = convert(
            r#"[
                {"type": "relation", "id": 50, "tags": {"type": "multipolygon"}},
                {"type": "relation", "id": 51, "tags": {"type": "multipolygon"},
                 "members": []},
                {"type": "relation", "id": 52, "tags": {"type": "route"},
                 "members": []}
            ]"#,
        );
        assert!(result.features.is_empty());
    }

    #[test]
    fn ways_with_missing_nodes_are_tainted() {
        let result = convert(
            r#"[
                {"type": "node", "id": 1, "lat": 0.0, "lon": 0.0},
                {"type": "node", "id": 2, "lat": 0.0, "lon": 1.0},
                {"type": "way", "id": 10, "nodes": [1, 2, 99],
                 "tags": {"highway": "residential"}}
            ]"#,
        );
        assert_eq!(result.features.len(), 1);
        let feature = &result.features[0];
        assert_eq!(feature.properties["tainted"], json!(true));
        match &feature.geometry {
            Geometry::LineString(coordinates) => assert_eq!(coordinates.len(), 2),
            other => panic!("unexpected geometry: {:?}", other),
        }
    }

    #[test]
    fn route_relations_join_members_into_lines() {
        let result = convert(
            r#"[
                {"type": "node", "id": 1, "lat": 0.0, "lon": 0.0},
                {"type": "node", "id": 2, "lat": 0.0, "lon": 1.0},
                {"type": "node", "id": 3, "lat": 0.0, "lon": 2.0},
                {"type": "way", "id": 20, "nodes": [1, 2]},
                {"type": "way", "id": 21, "nodes": [2, 3]},
                {"type": "relation", "id": 60,
                 "tags": {"type": "route", "route": "bus"},
                 "members": [
                     {"type": "way", "ref": 20, "role": ""},
                     {"type": "way", "ref": 21, "role": ""}
                 ]}
            ]"#,
        );
        assert_eq!(result.features.len(), 1);
        let feature = &result.features[0];
        assert_eq!(feature.id, "relation/60");
        match &feature.geometry {
            Geometry::LineString(coordinates) => assert_eq!(coordinates.len(), 3),
            other => panic!("unexpected geometry: {:?}", other),
        }
    }

    #[test]
    fn disconnected_route_members_become_a_multi_line_string() {
        let result = convert(
            r#"[
                {"type": "node", "id": 1, "lat": 0.0, "lon": 0.0},
                {"type": "node", "id": 2, "lat": 0.0, "lon": 1.0},
                {"type": "node", "id": 3, "lat": 5.0, "lon": 5.0},
                {"type": "node", "id": 4, "lat": 5.0, "lon": 6.0},
                {"type": "way", "id": 20, "nodes": [1, 2]},
                {"type": "way", "id": 21, "nodes": [3, 4]},
                {"type": "relation", "id": 60,
                 "tags": {"type": "route", "route": "bus"},
                 "members": [
                     {"type": "way", "ref": 20, "role": ""},
                     {"type": "way", "ref": 21, "role": ""}
                 ]}
            ]"#,
        );
        assert!(matches!(
            result.features[0].geometry,
            Geometry::MultiLineString(_)
        ));
    }

    #[test]
    fn duplicate_records_merge_by_version() {
        let result = convert(
            r#"[
                {"type": "node", "id": 1, "lat": 1.0, "lon": 2.0,
                 "tags": {"foo": "bar", "dupe": "x"}},
                {"type": "node", "id": 1, "lat": 1.0, "lon": 2.0,
                 "tags": {"asd": "fasd", "dupe": "y"}}
            ]"#,
        );
        assert_eq!(result.features.len(), 1);
        let tags = &result.features[0].properties["tags"];
        assert_eq!(tags["foo"], json!("bar"));
        assert_eq!(tags["asd"], json!("fasd"));
        assert_eq!(tags["dupe"], json!("y"));

        let result = convert(
            r#"[
                {"type": "node", "id": 1, "lat": 1.0, "lon": 2.0, "version": 2,
                 "tags": {"foo": "bar", "dupe": "x"}},
                {"type": "node", "id": 1, "lat": 1.0, "lon": 2.0, "version": 1,
                 "tags": {"asd": "fasd", "dupe": "y"}}
            ]"#,
        );
        let tags = &result.features[0].properties["tags"];
        assert_eq!(tags["dupe"], json!("x"));
        assert_eq!(tags.get("asd"), None);
    }

    #[test]
    fn center_placeholders_become_points() {
        let result = convert(
            r#"[{"type": "way", "id": 1, "tags": {"amenity": "parking"},
                 "center": {"lat": 2.5, "lon": 3.5}}]"#,
        );
        assert_eq!(result.features.len(), 1);
        let feature = &result.features[0];
        assert_eq!(feature.id, "way/1");
        assert_eq!(feature.geometry, Geometry::Point([3.5, 2.5]));
        assert_eq!(feature.properties["geometry"], json!("center"));
    }

    #[test]
    fn bounds_placeholders_become_polygons() {
        let result = convert(
            r#"[{"type": "way", "id": 2, "tags": {"building": "yes"},
                 "bounds": {"minlat": 0.0, "minlon": 0.0, "maxlat": 1.0, "maxlon": 1.0}}]"#,
        );
        assert_eq!(result.features.len(), 1);
        let feature = &result.features[0];
        assert_eq!(feature.id, "way/2");
        assert_eq!(feature.properties["geometry"], json!("bounds"));
        match &feature.geometry {
            Geometry::Polygon(rings) => assert_eq!(rings[0].len(), 5),
            other => panic!("unexpected geometry: {:?}", other),
        }
    }

    #[test]
    fn full_geometry_output_needs_no_node_records() {
        let result = convert(
            r#"[{
                "type": "way", "id": 1,
                "tags": {"highway": "residential"},
                "geometry": [
                    {"lat": 1.0, "lon": 2.0},
                    {"lat": 3.0, "lon": 4.0}
                ]
            }]"#,
        );
        assert_eq!(result.features.len(), 1);
        assert_eq!(
            result.features[0].geometry,
            Geometry::LineString(vec![[2.0, 1.0], [4.0, 3.0]])
        );
    }

    #[test]
    fn full_geometry_relations_resolve_against_output_ids() {
        let result = convert(
            r#"[{
                "type": "relation", "id": 5,
                "tags": {"type": "multipolygon", "natural": "water"},
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
        );
        assert_eq!(result.features.len(), 1);
        let feature = &result.features[0];
        assert_eq!(feature.id, "relation/5");
        assert!(matches!(feature.geometry, Geometry::Polygon(_)));
    }

    #[test]
    fn flat_properties_merge_meta_tags_and_id() {
        let converter = OsmToGeoJson::new().flat_properties(true);
        let result = converter
            .convert_overpass_json(
                r#"[{"type": "node", "id": 1, "lat": 1.0, "lon": 2.0,
                     "version": 3, "tags": {"amenity": "cafe"}}]"#,
                None,
            )
            .unwrap();
        let properties = &result.features[0].properties;
        assert_eq!(properties["id"], json!("node/1"));
        assert_eq!(properties["amenity"], json!("cafe"));
        assert_eq!(properties["version"], json!(3));
        assert_eq!(properties.get("tags"), None);
        assert_eq!(properties.get("meta"), None);
    }

    #[test]
    fn sink_sees_every_feature_before_flattening() {
        let converter = OsmToGeoJson::new().flat_properties(true);
        let mut streamed: Vec<String> = Vec::new();
        let mut nested = true;
        let result = converter
            .convert_overpass_json(
                r#"[
                    {"type": "node", "id": 1, "lat": 0.0, "lon": 0.0},
                    {"type": "node", "id": 2, "lat": 0.0, "lon": 1.0},
                    {"type": "node", "id": 5, "lat": 9.0, "lon": 9.0,
                     "tags": {"amenity": "bench"}},
                    {"type": "way", "id": 20, "nodes": [1, 2],
                     "tags": {"highway": "residential"}}
                ]"#,
                Some(&mut |feature: &Feature| {
                    streamed.push(feature.id.clone());
                    nested &= feature.properties.contains_key("tags");
                }),
            )
            .unwrap();
        assert_eq!(streamed.len(), result.features.len());
        assert!(streamed.contains(&"way/20".to_string()));
        assert!(streamed.contains(&"node/5".to_string()));
        assert!(nested);
        assert!(!result.features[0].properties.contains_key("tags"));
    }

    #[test]
    fn custom_uninteresting_tags_change_poi_selection() {
        let converter =
            OsmToGeoJson::new().uninteresting_tags(vec![UninterestingTag::key("foo")]);
        let result = converter
            .convert_overpass_json(
                r#"[
                    {"type": "node", "id": 1, "lat": 0.0, "lon": 0.0,
                     "tags": {"foo": "bar"}},
                    {"type": "node", "id": 2, "lat": 0.0, "lon": 1.0,
                     "tags": {"foo": "bar", "name": "kept"}}
                ]"#,
                None,
            )
            .unwrap();
        assert_eq!(result.features.len(), 1);
        assert_eq!(result.features[0].id, "node/2");
    }

    #[test]
    fn validator_callbacks_override_the_default_rules() {
        let converter = OsmToGeoJson::new()
            .uninteresting_tags_validator(Box::new(
                |tags: &Tags, _ignore: &[UninterestingTag]| {
                    tags.get("tag").map(String::as_str) != Some("1")
                },
            ))
            .polygon_features_validator(Box::new(|tags: &Tags| {
                tags.get("tag").map(String::as_str) == Some("1")
            }));
        let result = converter
            .convert_overpass_json(
                r#"[
                    {"type": "node", "id": 1, "lat": 0.0, "lon": 0.0},
                    {"type": "node", "id": 2, "lat": 0.0, "lon": 1.0},
                    {"type": "node", "id": 3, "lat": 1.0, "lon": 1.0},
                    {"type": "node", "id": 4, "lat": 5.0, "lon": 5.0,
                     "tags": {"tag": "1"}},
                    {"type": "node", "id": 5, "lat": 6.0, "lon": 6.0,
                     "tags": {"name": "ignored"}},
                    {"type": "way", "id": 10, "nodes": [1, 2, 3, 1],
                     "tags": {"tag": "1"}}
                ]"#,
                None,
            )
            .unwrap();
        assert_eq!(result.features.len(), 2);
        assert!(matches!(result.features[0].geometry, Geometry::Polygon(_)));
        assert_eq!(result.features[1].id, "node/4");
    }

    #[test]
    fn xml_and_json_inputs_agree() {
        let converter = OsmToGeoJson::new();
        let from_json = converter
            .convert_overpass_json(
                r#"[
                    {"type": "node", "id": 1, "lat": 0.0, "lon": 0.0},
                    {"type": "node", "id": 2, "lat": 0.0, "lon": 1.0},
                    {"type": "way", "id": 10, "nodes": [1, 2],
                     "tags": {"highway": "residential"}}
                ]"#,
                None,
            )
            .unwrap();
        let from_xml = converter
            .convert_osm_xml(
                r#"<osm>
                    <node id="1" lat="0.0" lon="0.0"/>
                    <node id="2" lat="0.0" lon="1.0"/>
                    <way id="10">
                        <nd ref="1"/>
                        <nd ref="2"/>
                        <tag k="highway" v="residential"/>
                    </way>
                </osm>"#,
                None,
            )
            .unwrap();
        assert_eq!(from_json.features.len(), from_xml.features.len());
        assert_eq!(from_json.features[0].id, from_xml.features[0].id);
        assert_eq!(from_json.features[0].geometry, from_xml.features[0].geometry);
        assert_eq!(
            from_json.features[0].properties["tags"],
            from_xml.features[0].properties["tags"]
        );
    }

    #[test]
    fn relation_node_members_are_emitted_when_tagged() {
        let result = convert(
            r#"[
                {"type": "node", "id": 1, "lat": 0.0, "lon": 0.0,
                 "tags": {"railway": "stop"}},
                {"type": "node", "id": 2, "lat": 0.0, "lon": 1.0},
                {"type": "way", "id": 20, "nodes": [1, 2]},
                {"type": "relation", "id": 70,
                 "tags": {"type": "route", "route": "train"},
                 "members": [
                     {"type": "way", "ref": 20, "role": ""},
                     {"type": "node", "ref": 1, "role": "stop"}
                 ]}
            ]"#,
        );
        let ids: Vec<&str> = result.features.iter().map(|f| f.id.as_str()).collect();
        assert!(ids.contains(&"relation/70"));
        assert!(ids.contains(&"node/1"));
        let stop = result
            .features
            .iter()
            .find(|feature| feature.id == "node/1")
            .unwrap();
        assert_eq!(stop.properties["relations"][0]["role"], json!("stop"));
        assert_eq!(stop.properties["relations"][0]["reltags"]["route"], json!("train"));
    }

    #[test]
    fn invalid_roles_are_excluded_from_ring_assembly() {
        let result = convert(
            r#"[
                {"type": "node", "id": 1, "lat": 0.0, "lon": 0.0},
                {"type": "node", "id": 2, "lat": 0.0, "lon": 3.0},
                {"type": "node", "id": 3, "lat": 3.0, "lon": 3.0},
                {"type": "node", "id": 5, "lat": 10.0, "lon": 10.0},
                {"type": "node", "id": 6, "lat": 10.0, "lon": 11.0},
                {"type": "way", "id": 10, "nodes": [1, 2, 3, 1]},
                {"type": "way", "id": 11, "nodes": [5, 6]},
                {"type": "relation", "id": 30,
                 "tags": {"type": "multipolygon", "natural": "water"},
                 "members": [
                     {"type": "way", "ref": 10, "role": "outer"},
                     {"type": "way", "ref": 11, "role": "unknown"}
                 ]}
            ]"#,
        );
        // the unknown-role way is not suppressed, so it renders on its own
        let ids: Vec<&str> = result.features.iter().map(|f| f.id.as_str()).collect();
        assert!(ids.contains(&"relation/30"));
        assert!(ids.contains(&"way/11"));
        let relation = result
            .features
            .iter()
            .find(|feature| feature.id == "relation/30")
            .unwrap();
        match &relation.geometry {
            Geometry::Polygon(rings) => assert_eq!(rings.len(), 1),
            other => panic!("unexpected geometry: {:?}", other),
        }
    }

    #[test]
    fn multipolygons_with_missing_ways_are_tainted() {
        let result = convert(&multipolygon_with_hole(r#", "building": "yes""#).replace(
            r#"{"type": "way", "id": 11, "nodes": [5, 6, 7, 8, 5]},"#,
            "",
        ));
        assert_eq!(result.features.len(), 1);
        let feature = &result.features[0];
        assert_eq!(feature.properties["tainted"], json!(true));
    }

    #[test]
    fn blank_roles_count_as_outer() {
        let result = convert(
            r#"[
                {"type": "node", "id": 1, "lat": 0.0, "lon": 0.0},
                {"type": "node", "id": 2, "lat": 0.0, "lon": 3.0},
                {"type": "node", "id": 3, "lat": 3.0, "lon": 3.0},
                {"type": "way", "id": 10, "nodes": [1, 2, 3, 1],
                 "tags": {"landuse": "forest"}},
                {"type": "relation", "id": 30,
                 "tags": {"type": "multipolygon"},
                 "members": [{"type": "way", "ref": 10, "role": ""}]}
            ]"#,
        );
        assert_eq!(result.features.len(), 1);
        assert_eq!(result.features[0].id, "way/10");
        assert!(matches!(result.features[0].geometry, Geometry::Polygon(_)));
    }

    #[test]
    fn separate_outer_rings_become_a_multipolygon() {
        let result = convert(
            r#"[
                {"type": "node", "id": 1, "lat": 0.0, "lon": 0.0},
                {"type": "node", "id": 2, "lat": 0.0, "lon": 1.0},
                {"type": "node", "id": 3, "lat": 1.0, "lon": 1.0},
                {"type": "node", "id": 5, "lat": 10.0, "lon": 10.0},
                {"type": "node", "id": 6, "lat": 10.0, "lon": 11.0},
                {"type": "node", "id": 7, "lat": 11.0, "lon": 11.0},
                {"type": "way", "id": 10, "nodes": [1, 2, 3, 1]},
                {"type": "way", "id": 11, "nodes": [5, 6, 7, 5]},
                {"type": "relation", "id": 30,
                 "tags": {"type": "multipolygon", "natural": "water"},
                 "members": [
                     {"type": "way", "ref": 10, "role": "outer"},
                     {"type": "way", "ref": 11, "role": "outer"}
                 ]}
            ]"#,
        );
        assert_eq!(result.features.len(), 1);
        match &result.features[0].geometry {
            Geometry::MultiPolygon(polygons) => assert_eq!(polygons.len(), 2),
            other => panic!("unexpected geometry: {:?}", other),
        }
    }
}
