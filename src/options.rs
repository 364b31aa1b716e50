use std::collections::{HashMap, HashSet};

use crate::element::{Node, Relation, Tags, Way};

/// A tag rule that marks elements as uninteresting. `Key` matches any value,
/// `KeyValue` only the exact pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UninterestingTag {
    Key(String),
    KeyValue(String, String),
}

impl UninterestingTag {
    pub fn key(key: impl Into<String>) -> UninterestingTag {
        UninterestingTag::Key(key.into())
    }

    pub fn key_value(key: impl Into<String>, value: impl Into<String>) -> UninterestingTag {
        UninterestingTag::KeyValue(key.into(), value.into())
    }

    pub fn matches(&self, key: &str, value: &str) -> bool {
        match self {
            UninterestingTag::Key(rule_key) => rule_key == key,
            UninterestingTag::KeyValue(rule_key, rule_value) => {
                rule_key == key && rule_value == value
            }
        }
    }
}

/// Bookkeeping tags that never make an element worth emitting on its own.
pub fn default_uninteresting_tags() -> Vec<UninterestingTag> {
    [
        "source",
        "source_ref",
        "source:ref",
        "history",
        "attribution",
        "created_by",
        "tiger:county",
        "tiger:tlid",
        "tiger:upload_uuid",
    ]
    .into_iter()
    .map(UninterestingTag::key)
    .collect()
}

/// Returns true when the tags are uninteresting. Receives the tag set and
/// the active ignore rules.
pub type UninterestingTagsValidator = dyn Fn(&Tags, &[UninterestingTag]) -> bool + Send + Sync;

/// Returns true when a closed way with these tags represents an area.
pub type PolygonFeaturesValidator = dyn Fn(&Tags) -> bool + Send + Sync;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PolygonMode {
    /// Every value of the key marks an area.
    All,
    /// Only the listed values mark an area.
    Whitelist,
    /// Every value except the listed ones marks an area.
    Blacklist,
}

#[derive(Clone, Debug)]
pub struct PolygonRule {
    pub key: String,
    pub mode: PolygonMode,
    pub values: Vec<String>,
}

impl PolygonRule {
    pub fn all(key: impl Into<String>) -> PolygonRule {
        PolygonRule {
            key: key.into(),
            mode: PolygonMode::All,
            values: Vec::new(),
        }
    }

    pub fn whitelist(key: impl Into<String>, values: &[&str]) -> PolygonRule {
        PolygonRule {
            key: key.into(),
            mode: PolygonMode::Whitelist,
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn blacklist(key: impl Into<String>, values: &[&str]) -> PolygonRule {
        PolygonRule {
            key: key.into(),
            mode: PolygonMode::Blacklist,
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }
}

enum CompiledRule {
    All,
    Included(HashSet<String>),
    Excluded(HashSet<String>),
}

/// Compiled polygon detection table, keyed by tag name.
pub struct PolygonFeatures {
    rules: HashMap<String, CompiledRule>,
}

impl PolygonFeatures {
    /// The stock osm-polygon-features table.
    pub fn osm_defaults() -> PolygonFeatures {
        let mut features = PolygonFeatures {
            rules: HashMap::new(),
        };
        features.add_rules(&default_polygon_rules());
        features
    }

    /// Adds rules on top of the current table; a rule replaces any earlier
    /// rule for the same key.
    pub fn add_rules(&mut self, rules: &[PolygonRule]) {
        for rule in rules {
            let values: HashSet<String> = rule.values.iter().cloned().collect();
            let compiled = match rule.mode {
                PolygonMode::All => CompiledRule::All,
                PolygonMode::Whitelist => CompiledRule::Included(values),
                PolygonMode::Blacklist => CompiledRule::Excluded(values),
            };
            self.rules.insert(rule.key.clone(), compiled);
        }
    }

    /// Decides whether a closed way with these tags is an area.
    /// `area=no` always opts out, as does a literal `no` value on the
    /// matched key.
    pub fn is_polygon_feature(&self, tags: &Tags) -> bool {
        if tags.get("area").map(String::as_str) == Some("no") {
            return false;
        }
        for (key, value) in tags {
            if value == "no" {
                continue;
            }
            match self.rules.get(key) {
                Some(CompiledRule::All) => return true,
                Some(CompiledRule::Included(values)) if values.contains(value) => return true,
                Some(CompiledRule::Excluded(values)) if !values.contains(value) => return true,
                _ => {}
            }
        }
        false
    }
}

fn default_polygon_rules() -> Vec<PolygonRule> {
    vec![
        PolygonRule::all("building"),
        PolygonRule::whitelist("highway", &["services", "rest_area", "escape", "elevator"]),
        PolygonRule::blacklist(
            "natural",
            &["coastline", "cliff", "ridge", "arete", "tree_row"],
        ),
        PolygonRule::all("landuse"),
        PolygonRule::whitelist("waterway", &["riverbank", "dock", "boatyard", "dam"]),
        PolygonRule::all("amenity"),
        PolygonRule::all("leisure"),
        PolygonRule::whitelist(
            "barrier",
            &["city_wall", "ditch", "hedge", "retaining_wall", "wall", "spikes"],
        ),
        PolygonRule::whitelist(
            "railway",
            &["station", "turntable", "roundhouse", "platform"],
        ),
        PolygonRule::all("area"),
        PolygonRule::all("boundary"),
        PolygonRule::blacklist("man_made", &["cutline", "embankment", "pipeline"]),
        PolygonRule::whitelist(
            "power",
            &["plant", "substation", "generator", "transformer"],
        ),
        PolygonRule::all("place"),
        PolygonRule::all("shop"),
        PolygonRule::blacklist("aeroway", &["taxiway"]),
        PolygonRule::all("tourism"),
        PolygonRule::all("historic"),
        PolygonRule::all("public_transport"),
        PolygonRule::all("office"),
        PolygonRule::all("building:part"),
        PolygonRule::all("military"),
        PolygonRule::all("ruins"),
        PolygonRule::all("area:highway"),
        PolygonRule::all("craft"),
        PolygonRule::all("golf"),
        PolygonRule::all("indoor"),
    ]
}

/// Strategy for merging records that share an id. The defaults keep the
/// strictly newer version whole and deep-merge equal versions.
pub trait Deduplicator: Send + Sync {
    fn deduplicate_node(&self, first: Node, second: Node) -> Node;
    fn deduplicate_way(&self, first: Way, second: Way) -> Way;
    fn deduplicate_relation(&self, first: Relation, second: Relation) -> Relation;
}

pub struct DefaultDeduplicator;

impl Deduplicator for DefaultDeduplicator {
    fn deduplicate_node(&self, first: Node, second: Node) -> Node {
        let (first_version, second_version) =
            (first.meta.version_number(), second.meta.version_number());
        if first_version > second_version {
            first
        } else if second_version > first_version {
            second
        } else {
            first.merged_with(second)
        }
    }

    fn deduplicate_way(&self, first: Way, second: Way) -> Way {
        let (first_version, second_version) =
            (first.meta.version_number(), second.meta.version_number());
        if first_version > second_version {
            first
        } else if second_version > first_version {
            second
        } else {
            first.merged_with(second)
        }
    }

    fn deduplicate_relation(&self, first: Relation, second: Relation) -> Relation {
        let (first_version, second_version) =
            (first.meta.version_number(), second.meta.version_number());
        if first_version > second_version {
            first
        } else if second_version > first_version {
            second
        } else {
            first.merged_with(second)
        }
    }
}

#[cfg(test)]
fn tags(pairs: &[(&str, &str)]) -> Tags {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn polygon_table_covers_common_cases() {
    let features = PolygonFeatures::osm_defaults();
    assert!(features.is_polygon_feature(&tags(&[("building", "yes")])));
    assert!(features.is_polygon_feature(&tags(&[("building", "residential")])));
    assert!(features.is_polygon_feature(&tags(&[("highway", "services")])));
    assert!(!features.is_polygon_feature(&tags(&[("highway", "primary")])));
    assert!(features.is_polygon_feature(&tags(&[("natural", "water")])));
    assert!(!features.is_polygon_feature(&tags(&[("natural", "coastline")])));
    assert!(!features.is_polygon_feature(&tags(&[("name", "unmatched")])));
}

#[test]
fn no_values_opt_out_of_polygon_detection() {
    let features = PolygonFeatures::osm_defaults();
    assert!(!features.is_polygon_feature(&tags(&[("building", "no")])));
    assert!(!features.is_polygon_feature(&tags(&[("building", "yes"), ("area", "no")])));
    assert!(features.is_polygon_feature(&tags(&[("building", "no"), ("landuse", "grass")])));
}

#[test]
fn added_rules_replace_defaults_per_key() {
    let mut features = PolygonFeatures::osm_defaults();
    features.add_rules(&[
        PolygonRule::whitelist("building", &["special"]),
        PolygonRule::all("is_polygon_key"),
    ]);
    assert!(!features.is_polygon_feature(&tags(&[("building", "yes")])));
    assert!(features.is_polygon_feature(&tags(&[("building", "special")])));
    assert!(features.is_polygon_feature(&tags(&[("is_polygon_key", "anything")])));
}

#[test]
fn default_deduplicator_prefers_newer_versions() {
    use crate::element::{ElementKind, Meta, OsmId};
    use serde_json::Value;

    let node = |version: i64, tag_value: &str| Node {
        kind: ElementKind::Node,
        id: OsmId::Int(1),
        lat: Some(1.0),
        lon: Some(2.0),
        tags: tags(&[("dupe", tag_value)]),
        meta: Meta {
            version: Some(Value::from(version)),
            ..Meta::default()
        },
        is_center_placeholder: false,
    };
    let dedup = DefaultDeduplicator;
    let newer_wins = dedup.deduplicate_node(node(1, "x"), node(2, "y"));
    assert_eq!(newer_wins.tags.get("dupe").map(String::as_str), Some("y"));
    let older_kept = dedup.deduplicate_node(node(3, "x"), node(2, "y"));
    assert_eq!(older_kept.tags.get("dupe").map(String::as_str), Some("x"));
}

#[test]
fn equal_versions_merge_with_later_record_winning() {
    use crate::element::{ElementKind, Meta, OsmId};

    let node = |tag_pairs: &[(&str, &str)]| Node {
        kind: ElementKind::Node,
        id: OsmId::Int(1),
        lat: Some(1.0),
        lon: Some(2.0),
        tags: tags(tag_pairs),
        meta: Meta::default(),
        is_center_placeholder: false,
    };
    let dedup = DefaultDeduplicator;
    let merged = dedup.deduplicate_node(
        node(&[("foo", "bar"), ("dupe", "x")]),
        node(&[("asd", "fasd"), ("dupe", "y")]),
    );
    assert_eq!(merged.tags.get("foo").map(String::as_str), Some("bar"));
    assert_eq!(merged.tags.get("asd").map(String::as_str), Some("fasd"));
    assert_eq!(merged.tags.get("dupe").map(String::as_str), Some("y"));
}
