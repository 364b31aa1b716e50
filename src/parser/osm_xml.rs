//! OSM XML parser, including the Overpass extensions (`<center>`,
//! `<bounds>`, inline full geometry on `<nd>` and member `<nd>` children).

use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde_json::Value;
use std::collections::HashMap;
use std::io::BufRead;

use super::{anonymous_node_id, Bounds, Parsed, UNKNOWN_LOCATION_ID};
use crate::element::{
    ElementKind, Member, Meta, Node, OsmId, Relation, Tags, Way, FULL_GEOM_PREFIX,
};

pub fn parse(data: &str) -> Result<Parsed> {
    let mut entity_storages = Parsed::new();
    let mut parser = Reader::from_reader(data.as_bytes());

    let mut buf = Vec::new();
    loop {
        let e = parser
            .read_event_into(&mut buf)
            .context("Failed to parse the XML input")?;
        match e {
            Event::Eof => break,
            Event::Start(start) => process_element(&mut parser, &start, true, &mut entity_storages)?,
            Event::Empty(start) => {
                process_element(&mut parser, &start, false, &mut entity_storages)?
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(entity_storages)
}

fn process_element<R: BufRead>(
    parser: &mut Reader<R>,
    start: &BytesStart,
    have_subelements: bool,
    entity_storages: &mut Parsed,
) -> Result<()> {
    match start.local_name().as_ref() {
        b"node" => process_node(parser, start, have_subelements, entity_storages),
        b"way" => process_way(parser, start, have_subelements, entity_storages),
        b"relation" => process_relation(parser, start, have_subelements, entity_storages),
        _ => Ok(()),
    }
}

fn process_subelements<R: BufRead, F>(
    entity_name: &[u8],
    parser: &mut Reader<R>,
    mut subelement_processor: F,
) -> Result<()>
where
    F: FnMut(&mut Reader<R>, &BytesStart, bool) -> Result<()>,
{
    let mut buf = Vec::new();
    loop {
        let e = parser.read_event_into(&mut buf).context(format!(
            "Failed to parse the XML input when processing {}",
            ascii_name_as_str(entity_name)
        ))?;
        match e {
            Event::Eof => break,
            Event::End(end) if end.local_name().as_ref() == entity_name => break,
            Event::Start(start) => subelement_processor(parser, &start, true)?,
            Event::Empty(start) => subelement_processor(parser, &start, false)?,
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

fn process_node<R: BufRead>(
    parser: &mut Reader<R>,
    start: &BytesStart,
    have_subelements: bool,
    entity_storages: &mut Parsed,
) -> Result<()> {
    let attrs = collect_attrs(parser, start)?;
    let mut tags = Tags::new();
    if have_subelements {
        process_subelements(b"node", parser, |parser, sub, _| {
            try_add_tag(parser, sub, &mut tags)
        })?;
    }
    let id = match attrs.get("id") {
        Some(text) => OsmId::parse(text),
        None => return Ok(()),
    };
    entity_storages.nodes.push(Node {
        kind: ElementKind::Node,
        id,
        lat: parse_coord(attrs.get("lat")),
        lon: parse_coord(attrs.get("lon")),
        tags,
        meta: meta_from_attrs(&attrs),
        is_center_placeholder: false,
    });
    Ok(())
}

struct NdAttrs {
    ref_id: Option<String>,
    lat: Option<String>,
    lon: Option<String>,
}

fn process_way<R: BufRead>(
    parser: &mut Reader<R>,
    start: &BytesStart,
    have_subelements: bool,
    entity_storages: &mut Parsed,
) -> Result<()> {
    let attrs = collect_attrs(parser, start)?;
    let mut tags = Tags::new();
    let mut nds: Vec<NdAttrs> = Vec::new();
    let mut center: Option<HashMap<String, String>> = None;
    let mut bounds: Option<Bounds> = None;
    if have_subelements {
        process_subelements(b"way", parser, |parser, sub, _| {
            match sub.local_name().as_ref() {
                b"tag" => return try_add_tag(parser, sub, &mut tags),
                b"nd" => {
                    let nd_attrs = collect_attrs(parser, sub)?;
                    nds.push(NdAttrs {
                        ref_id: nd_attrs.get("ref").cloned(),
                        lat: nd_attrs.get("lat").cloned(),
                        lon: nd_attrs.get("lon").cloned(),
                    });
                }
                b"center" => center = Some(collect_attrs(parser, sub)?),
                b"bounds" => bounds = bounds_from_attrs(&collect_attrs(parser, sub)?),
                _ => {}
            }
            Ok(())
        })?;
    }
    let id = match attrs.get("id") {
        Some(text) => OsmId::parse(text),
        None => return Ok(()),
    };
    let meta = meta_from_attrs(&attrs);

    if let Some(center) = center {
        entity_storages.add_center_placeholder(
            ElementKind::Way,
            id.clone(),
            tags.clone(),
            meta.clone(),
            parse_coord(center.get("lat")),
            parse_coord(center.get("lon")),
        );
    }

    let has_full_geometry = nds.iter().any(|nd| nd.lat.is_some());
    let node_ids: Vec<OsmId> = nds
        .iter()
        .map(|nd| match (&nd.ref_id, &nd.lat, &nd.lon) {
            (Some(node_ref), _, _) => OsmId::parse(node_ref),
            (None, Some(lat), Some(lon)) => anonymous_node_id(lat, lon),
            _ => OsmId::Str(UNKNOWN_LOCATION_ID.to_string()),
        })
        .collect();
    if has_full_geometry {
        for (index, nd) in nds.iter().enumerate() {
            if let (Some(lat), Some(lon)) =
                (parse_coord(nd.lat.as_ref()), parse_coord(nd.lon.as_ref()))
            {
                entity_storages.add_full_geometry_node(node_ids[index].clone(), lat, lon);
            }
        }
    }

    entity_storages.ways.push(Way {
        kind: ElementKind::Way,
        id: id.clone(),
        nodes: node_ids,
        tags: tags.clone(),
        meta: meta.clone(),
        is_bounds_placeholder: false,
    });

    if !has_full_geometry {
        if let Some(bounds) = bounds {
            entity_storages.add_bounds_placeholder(ElementKind::Way, &id, tags, meta, bounds);
        }
    }
    Ok(())
}

struct RawMember {
    kind: String,
    ref_id: Option<String>,
    role: Option<String>,
    lat: Option<String>,
    lon: Option<String>,
    nds: Vec<(Option<String>, Option<String>)>,
}

fn process_relation<R: BufRead>(
    parser: &mut Reader<R>,
    start: &BytesStart,
    have_subelements: bool,
    entity_storages: &mut Parsed,
) -> Result<()> {
    let attrs = collect_attrs(parser, start)?;
    let mut tags = Tags::new();
    let mut raw_members: Vec<RawMember> = Vec::new();
    let mut center: Option<HashMap<String, String>> = None;
    let mut bounds: Option<Bounds> = None;
    if have_subelements {
        process_subelements(b"relation", parser, |parser, sub, sub_children| {
            match sub.local_name().as_ref() {
                b"tag" => return try_add_tag(parser, sub, &mut tags),
                b"member" => {
                    let member_attrs = collect_attrs(parser, sub)?;
                    let mut member = RawMember {
                        kind: member_attrs.get("type").cloned().unwrap_or_default(),
                        ref_id: member_attrs.get("ref").cloned(),
                        role: member_attrs.get("role").cloned(),
                        lat: member_attrs.get("lat").cloned(),
                        lon: member_attrs.get("lon").cloned(),
                        nds: Vec::new(),
                    };
                    if sub_children {
                        process_subelements(b"member", parser, |parser, nd, _| {
                            if nd.local_name().as_ref() == b"nd" {
                                let nd_attrs = collect_attrs(parser, nd)?;
                                member
                                    .nds
                                    .push((nd_attrs.get("lat").cloned(), nd_attrs.get("lon").cloned()));
                            }
                            Ok(())
                        })?;
                    }
                    raw_members.push(member);
                }
                b"center" => center = Some(collect_attrs(parser, sub)?),
                b"bounds" => bounds = bounds_from_attrs(&collect_attrs(parser, sub)?),
                _ => {}
            }
            Ok(())
        })?;
    }
    let id = match attrs.get("id") {
        Some(text) => OsmId::parse(text),
        None => return Ok(()),
    };
    let meta = meta_from_attrs(&attrs);

    if let Some(center) = center {
        entity_storages.add_center_placeholder(
            ElementKind::Relation,
            id.clone(),
            tags.clone(),
            meta.clone(),
            parse_coord(center.get("lat")),
            parse_coord(center.get("lon")),
        );
    }

    let has_full_geometry = raw_members.iter().any(|member| match member.kind.as_str() {
        "node" => member.lat.is_some(),
        "way" => !member.nds.is_empty(),
        _ => false,
    });

    let mut members = Vec::with_capacity(raw_members.len());
    for raw in &raw_members {
        let ref_text = match &raw.ref_id {
            Some(ref_text) => ref_text,
            None => continue,
        };
        let mut ref_id = OsmId::parse(ref_text);
        if has_full_geometry {
            match raw.kind.as_str() {
                "node" => {
                    if let (Some(lat), Some(lon)) =
                        (parse_coord(raw.lat.as_ref()), parse_coord(raw.lon.as_ref()))
                    {
                        entity_storages.add_full_geometry_node(ref_id.clone(), lat, lon);
                    }
                }
                "way" if !raw.nds.is_empty() => {
                    let node_ids: Vec<OsmId> = raw
                        .nds
                        .iter()
                        .map(|(lat, lon)| match (lat, lon) {
                            (Some(lat), Some(lon)) => anonymous_node_id(lat, lon),
                            _ => OsmId::Str(UNKNOWN_LOCATION_ID.to_string()),
                        })
                        .collect();
                    for (index, (lat, lon)) in raw.nds.iter().enumerate() {
                        if let (Some(lat), Some(lon)) =
                            (parse_coord(lat.as_ref()), parse_coord(lon.as_ref()))
                        {
                            entity_storages
                                .add_full_geometry_node(node_ids[index].clone(), lat, lon);
                        }
                    }
                    ref_id = OsmId::Str(format!("{}{}", FULL_GEOM_PREFIX, ref_id));
                    entity_storages.add_full_geometry_way(ref_id.clone(), node_ids);
                }
                _ => {}
            }
        }
        members.push(Member {
            kind: raw.kind.clone(),
            ref_id,
            role: raw.role.clone(),
        });
    }

    if !has_full_geometry {
        if let Some(bounds) = bounds {
            entity_storages.add_bounds_placeholder(
                ElementKind::Relation,
                &id,
                tags.clone(),
                meta.clone(),
                bounds,
            );
        }
    }

    entity_storages.relations.push(Relation {
        id,
        tags,
        meta,
        members: if members.is_empty() { None } else { Some(members) },
    });
    Ok(())
}

fn ascii_name_as_str(elem_name: &[u8]) -> &str {
    std::str::from_utf8(elem_name).unwrap_or("N/A")
}

fn collect_attrs<R: BufRead>(
    parser: &Reader<R>,
    start: &BytesStart,
) -> Result<HashMap<String, String>> {
    let mut collected = HashMap::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = ascii_name_as_str(attr.key.local_name().as_ref()).to_string();
        let value = attr.decode_and_unescape_value(parser)?.to_string();
        collected.insert(key, value);
    }
    Ok(collected)
}

fn try_add_tag<R: BufRead>(parser: &Reader<R>, start: &BytesStart, tags: &mut Tags) -> Result<()> {
    let attrs = collect_attrs(parser, start)?;
    if let (Some(key), Some(value)) = (attrs.get("k"), attrs.get("v")) {
        tags.insert(key.clone(), value.clone());
    }
    Ok(())
}

fn parse_coord(text: Option<&String>) -> Option<f64> {
    text.and_then(|text| text.parse().ok())
}

fn bounds_from_attrs(attrs: &HashMap<String, String>) -> Option<Bounds> {
    Some(Bounds {
        minlat: parse_coord(attrs.get("minlat"))?,
        minlon: parse_coord(attrs.get("minlon"))?,
        maxlat: parse_coord(attrs.get("maxlat"))?,
        maxlon: parse_coord(attrs.get("maxlon"))?,
    })
}

/// Authorship attributes are kept as strings, the way the document spells
/// them.
fn meta_from_attrs(attrs: &HashMap<String, String>) -> Meta {
    let field = |name: &str| attrs.get(name).map(|text| Value::from(text.clone()));
    Meta {
        timestamp: field("timestamp"),
        version: field("version"),
        changeset: field("changeset"),
        user: field("user"),
        uid: field("uid"),
    }
}

#[test]
fn parses_nodes_ways_and_relations() {
    let parsed = parse(
        r#"<osm version="0.6">
            <node id="1" lat="1.0" lon="2.0" version="2" user="alice">
                <tag k="amenity" v="cafe"/>
            </node>
            <node id="2" lat="1.5" lon="2.5"/>
            <way id="3" version="1">
                <nd ref="1"/>
                <nd ref="2"/>
                <tag k="highway" v="residential"/>
            </way>
            <relation id="4">
                <member type="way" ref="3" role="outer"/>
                <tag k="type" v="multipolygon"/>
            </relation>
        </osm>"#,
    )
    .unwrap();
    assert_eq!(parsed.nodes.len(), 2);
    assert_eq!(parsed.ways.len(), 1);
    assert_eq!(parsed.relations.len(), 1);
    let node = &parsed.nodes[0];
    assert_eq!(node.id, OsmId::Int(1));
    assert_eq!(node.lat, Some(1.0));
    assert_eq!(node.tags.get("amenity").map(String::as_str), Some("cafe"));
    assert_eq!(node.meta.version, Some(Value::from("2")));
    assert_eq!(node.meta.user, Some(Value::from("alice")));
    assert_eq!(parsed.ways[0].nodes, vec![OsmId::Int(1), OsmId::Int(2)]);
    let members = parsed.relations[0].members.as_ref().unwrap();
    assert_eq!(members[0].ref_id, OsmId::Int(3));
    assert_eq!(members[0].role.as_deref(), Some("outer"));
}

#[test]
fn member_nd_children_expand_to_full_geometry() {
    let parsed = parse(
        r#"<osm>
            <relation id="5">
                <member type="way" ref="9" role="outer">
                    <nd lat="0.0" lon="0.0"/>
                    <nd lat="0.0" lon="1.0"/>
                    <nd lat="1.0" lon="1.0"/>
                    <nd lat="0.0" lon="0.0"/>
                </member>
                <tag k="type" v="multipolygon"/>
            </relation>
        </osm>"#,
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
fn coordinate_carrying_nds_synthesize_anonymous_nodes() {
    let parsed = parse(
        r#"<osm>
            <way id="1">
                <nd lat="1.0" lon="2.0"/>
                <nd lat="3.0" lon="4.0"/>
                <tag k="highway" v="residential"/>
            </way>
        </osm>"#,
    )
    .unwrap();
    assert_eq!(
        parsed.ways[0].nodes,
        vec![
            OsmId::Str("_anonymous@1.0/2.0".to_string()),
            OsmId::Str("_anonymous@3.0/4.0".to_string()),
        ]
    );
    assert_eq!(parsed.nodes.len(), 2);
}

#[test]
fn center_and_bounds_subelements_expand_to_placeholders() {
    let parsed = parse(
        r#"<osm>
            <way id="1">
                <center lat="2.5" lon="3.5"/>
                <tag k="amenity" v="parking"/>
            </way>
            <way id="2">
                <bounds minlat="0.0" minlon="0.0" maxlat="1.0" maxlon="1.0"/>
                <tag k="building" v="yes"/>
            </way>
        </osm>"#,
    )
    .unwrap();
    let center = &parsed.nodes[0];
    assert!(center.is_center_placeholder);
    assert_eq!(center.kind, ElementKind::Way);
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
fn mismatched_tags_are_rejected() {
    assert!(parse("<osm><node id=\"1\"></osm>").is_err());
}
