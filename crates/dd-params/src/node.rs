//! Parameter tree nodes
//!
//! A parameter tree is a nested mapping from segment to [`Node`]. Whether a
//! JSON object is a leaf or a branch is decided once, at ingestion, from its
//! marker keys:
//! - an object holding `value` is a [`StatRecord`]
//! - an object holding any [`Region`] name is a [`RegionMap`]
//! - any other object is a [`Branch`]
//!
//! After parsing, code matches on the tagged union instead of probing keys.

use crate::region::Region;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// Nested mapping from path segment to node
pub type Branch = BTreeMap<String, Node>;

/// Per-region values; a missing value is `None`
pub type RegionMap = BTreeMap<Region, Option<f64>>;

/// Reserved key marking a statistic record
pub const VALUE_KEY: &str = "value";

/// Companion key of a statistic record
pub const STATISTIC_KEY: &str = "statistic";

/// A node of a parameter tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Terminal value; never recursed into
    Leaf(Leaf),
    /// Container of further nodes
    Branch(Branch),
}

/// Terminal value of a parameter tree
#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    /// Explicit null
    Null,
    /// String, number or boolean
    Scalar(Scalar),
    /// Value per region
    Regional(RegionMap),
    /// Value with the statistic it was derived with
    Stat(StatRecord),
    /// List-valued data, kept verbatim
    Array(Vec<Value>),
}

/// Scalar leaf value
///
/// Numbers keep their JSON form, so an integer written as `2030` reads back
/// as `2030` and not `2030.0`.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Number(Number),
    Text(String),
}

/// `{value, statistic}` record
///
/// `statistic` names how `value` was derived (`mean`, `high`, `low`, ...);
/// empty when the value was entered directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRecord {
    pub value: f64,
    #[serde(default)]
    pub statistic: String,
}

impl StatRecord {
    /// Record for a directly entered number
    #[inline]
    #[must_use]
    pub fn plain(value: f64) -> Self {
        Self {
            value,
            statistic: String::new(),
        }
    }
}

impl Node {
    /// Parse a JSON value into a node
    ///
    /// # Errors
    /// Returns [`TreeError::MalformedLeaf`] when an object carries marker keys
    /// but does not have the shape of the leaf they announce.
    pub fn from_json(value: Value) -> Result<Self, TreeError> {
        parse_node(value, &mut Vec::new())
    }

    /// Convert back to JSON
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Node::Leaf(leaf) => leaf.to_json(),
            Node::Branch(branch) => branch_to_json(branch),
        }
    }

    /// Leaf view of this node
    #[inline]
    #[must_use]
    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Node::Leaf(leaf) => Some(leaf),
            Node::Branch(_) => None,
        }
    }

    /// Branch view of this node
    #[inline]
    #[must_use]
    pub fn as_branch(&self) -> Option<&Branch> {
        match self {
            Node::Branch(branch) => Some(branch),
            Node::Leaf(_) => None,
        }
    }
}

impl From<Leaf> for Node {
    fn from(leaf: Leaf) -> Self {
        Node::Leaf(leaf)
    }
}

impl From<Branch> for Node {
    fn from(branch: Branch) -> Self {
        Node::Branch(branch)
    }
}

impl Leaf {
    /// Shorthand for a text scalar
    #[inline]
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Leaf::Scalar(Scalar::Text(s.into()))
    }

    /// Shorthand for a float scalar; a non-finite value is a null
    #[must_use]
    pub fn number(n: f64) -> Self {
        Number::from_f64(n).map_or(Leaf::Null, |n| Leaf::Scalar(Scalar::Number(n)))
    }

    /// Shorthand for an integer scalar
    #[inline]
    #[must_use]
    pub fn integer(n: i64) -> Self {
        Leaf::Scalar(Scalar::Number(n.into()))
    }

    /// Check for explicit null
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Leaf::Null)
    }

    /// Text content, if this is a text scalar
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Leaf::Scalar(Scalar::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Numeric content, if this is a number scalar
    #[inline]
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Leaf::Scalar(Scalar::Number(n)) => n.as_f64(),
            _ => None,
        }
    }

    /// Short description of the leaf shape, for diagnostics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Leaf::Null => "null",
            Leaf::Scalar(Scalar::Bool(_)) => "bool",
            Leaf::Scalar(Scalar::Number(_)) => "float",
            Leaf::Scalar(Scalar::Text(_)) => "str",
            Leaf::Regional(_) => "region map",
            Leaf::Stat(_) => "{value, statistic}",
            Leaf::Array(_) => "list",
        }
    }

    /// Render the leaf as it would appear in JSON text
    #[must_use]
    pub fn display_value(&self) -> String {
        match self {
            Leaf::Scalar(Scalar::Text(s)) => s.clone(),
            other => other.to_json().to_string(),
        }
    }

    /// Convert to JSON
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Leaf::Null => Value::Null,
            Leaf::Scalar(Scalar::Bool(b)) => Value::Bool(*b),
            Leaf::Scalar(Scalar::Number(n)) => Value::Number(n.clone()),
            Leaf::Scalar(Scalar::Text(s)) => Value::String(s.clone()),
            Leaf::Regional(map) => {
                let mut obj = Map::new();
                for (region, value) in map {
                    obj.insert(
                        region.as_str().to_string(),
                        value.map_or(Value::Null, number_json),
                    );
                }
                Value::Object(obj)
            }
            Leaf::Stat(record) => {
                let mut obj = Map::new();
                obj.insert(VALUE_KEY.to_string(), number_json(record.value));
                obj.insert(
                    STATISTIC_KEY.to_string(),
                    Value::String(record.statistic.clone()),
                );
                Value::Object(obj)
            }
            Leaf::Array(items) => Value::Array(items.clone()),
        }
    }
}

/// Parse the root of a parameter tree
///
/// # Errors
/// Returns [`TreeError::NotAnObject`] if `value` is not a JSON object, or
/// [`TreeError::MalformedLeaf`] for a malformed marker object.
pub fn tree_from_json(value: Value) -> Result<Branch, TreeError> {
    match value {
        Value::Object(map) => parse_branch(map, &mut Vec::new()),
        Value::Null => Ok(Branch::new()),
        other => Err(TreeError::NotAnObject {
            found: json_kind(&other),
        }),
    }
}

/// Convert a branch to a JSON object
#[must_use]
pub fn branch_to_json(branch: &Branch) -> Value {
    Value::Object(
        branch
            .iter()
            .map(|(k, node)| (k.clone(), node.to_json()))
            .collect(),
    )
}

fn number_json(n: f64) -> Value {
    Number::from_f64(n).map_or(Value::Null, Value::Number)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn parse_node(value: Value, path: &mut Vec<String>) -> Result<Node, TreeError> {
    let leaf = match value {
        Value::Null => Leaf::Null,
        Value::Bool(b) => Leaf::Scalar(Scalar::Bool(b)),
        Value::Number(n) => Leaf::Scalar(Scalar::Number(n)),
        Value::String(s) => Leaf::Scalar(Scalar::Text(s)),
        Value::Array(items) => Leaf::Array(items),
        Value::Object(map) => {
            if map.contains_key(VALUE_KEY) {
                parse_stat(map, path)?
            } else if map.keys().any(|k| Region::from_name(k).is_some()) {
                Leaf::Regional(parse_regions(map, path)?)
            } else {
                return parse_branch(map, path).map(Node::Branch);
            }
        }
    };
    Ok(Node::Leaf(leaf))
}

fn parse_branch(map: Map<String, Value>, path: &mut Vec<String>) -> Result<Branch, TreeError> {
    let mut branch = Branch::new();
    for (key, child) in map {
        path.push(key.clone());
        let node = parse_node(child, path)?;
        path.pop();
        branch.insert(key, node);
    }
    Ok(branch)
}

// `{"value": null}` carries no value and reads as an explicit null.
fn parse_stat(mut map: Map<String, Value>, path: &[String]) -> Result<Leaf, TreeError> {
    if let Some(extra) = map
        .keys()
        .find(|k| k.as_str() != VALUE_KEY && k.as_str() != STATISTIC_KEY)
    {
        return Err(TreeError::malformed(path, format!("unexpected key '{extra}'")));
    }
    let statistic = match map.remove(STATISTIC_KEY) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => {
            return Err(TreeError::malformed(
                path,
                format!("statistic must be a string, got {}", json_kind(&other)),
            ))
        }
    };
    match map.remove(VALUE_KEY) {
        Some(Value::Number(n)) => Ok(Leaf::Stat(StatRecord {
            value: as_f64(&n, path)?,
            statistic,
        })),
        Some(Value::Null) | None => Ok(Leaf::Null),
        Some(other) => Err(TreeError::malformed(
            path,
            format!("value must be a number, got {}", json_kind(&other)),
        )),
    }
}

fn parse_regions(map: Map<String, Value>, path: &[String]) -> Result<RegionMap, TreeError> {
    let mut regions = RegionMap::new();
    for (key, value) in map {
        let region = Region::from_name(&key)
            .ok_or_else(|| TreeError::malformed(path, format!("unknown region '{key}'")))?;
        let value = match value {
            Value::Null => None,
            Value::Number(n) => Some(as_f64(&n, path)?),
            other => {
                return Err(TreeError::malformed(
                    path,
                    format!("{key} must be a number, got {}", json_kind(&other)),
                ))
            }
        };
        regions.insert(region, value);
    }
    Ok(regions)
}

fn as_f64(n: &Number, path: &[String]) -> Result<f64, TreeError> {
    n.as_f64()
        .ok_or_else(|| TreeError::malformed(path, format!("number {n} is not representable")))
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Leaf(leaf) => leaf.serialize(serializer),
            Node::Branch(branch) => {
                let mut map = serializer.serialize_map(Some(branch.len()))?;
                for (k, v) in branch {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Node::from_json(value).map_err(D::Error::custom)
    }
}

impl Serialize for Leaf {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Leaf {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Node::deserialize(deserializer)? {
            Node::Leaf(leaf) => Ok(leaf),
            Node::Branch(_) => Err(D::Error::custom("expected a leaf value, found a branch")),
        }
    }
}

/// Errors raised while ingesting a parameter tree
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TreeError {
    /// Tree root is not an object
    #[error("parameter tree must be an object, got {found}")]
    NotAnObject { found: &'static str },

    /// Object with marker keys that is not a valid leaf
    #[error("malformed leaf at '{path}': {reason}")]
    MalformedLeaf { path: String, reason: String },
}

impl TreeError {
    fn malformed(path: &[String], reason: impl Into<String>) -> Self {
        Self::MalformedLeaf {
            path: path.join("."),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stat_record_is_leaf() {
        let node = Node::from_json(json!({"value": 2.5, "statistic": "mean"})).unwrap();
        assert_eq!(
            node,
            Node::Leaf(Leaf::Stat(StatRecord {
                value: 2.5,
                statistic: "mean".into()
            }))
        );
    }

    #[test]
    fn stat_record_statistic_defaults_empty() {
        let node = Node::from_json(json!({"value": 3})).unwrap();
        assert_eq!(node, Node::Leaf(Leaf::Stat(StatRecord::plain(3.0))));
    }

    #[test]
    fn stat_record_null_value_reads_as_null() {
        let node = Node::from_json(json!({"value": null, "statistic": ""})).unwrap();
        assert_eq!(node, Node::Leaf(Leaf::Null));
    }

    #[test]
    fn region_map_is_leaf() {
        let node = Node::from_json(json!({"World": 1.0, "China": null})).unwrap();
        let Node::Leaf(Leaf::Regional(map)) = node else {
            panic!("expected region map");
        };
        assert_eq!(map.get(&Region::World), Some(&Some(1.0)));
        assert_eq!(map.get(&Region::China), Some(&None));
    }

    #[test]
    fn region_map_rejects_foreign_key() {
        let err = tree_from_json(json!({"a": {"b": {"World": 1.0, "Mars": 2.0}}})).unwrap_err();
        assert_eq!(
            err,
            TreeError::MalformedLeaf {
                path: "a.b".into(),
                reason: "unknown region 'Mars'".into()
            }
        );
    }

    #[test]
    fn plain_object_is_branch() {
        let tree = tree_from_json(json!({"technologies": {"solarpvutil": {"lifetime": 30}}}))
            .unwrap();
        let tech = tree["technologies"].as_branch().unwrap();
        let fields = tech["solarpvutil"].as_branch().unwrap();
        assert_eq!(fields["lifetime"], Node::Leaf(Leaf::integer(30)));
    }

    #[test]
    fn integers_keep_their_form() {
        let input = json!({"settings": {"report_end_year": 2050, "discount_rate": 0.04}});
        let tree = tree_from_json(input.clone()).unwrap();
        assert_eq!(branch_to_json(&tree).to_string(), input.to_string());

        let year = tree["settings"].as_branch().unwrap()["report_end_year"]
            .as_leaf()
            .unwrap();
        assert_eq!(year.display_value(), "2050");
        assert_eq!(year.as_number(), Some(2050.0));
        assert_ne!(year, &Leaf::number(2050.0));
    }

    #[test]
    fn non_finite_number_is_null() {
        assert_eq!(Leaf::number(f64::NAN), Leaf::Null);
        assert_eq!(Leaf::number(f64::INFINITY).to_json(), Value::Null);
    }

    #[test]
    fn empty_object_is_empty_branch() {
        let node = Node::from_json(json!({})).unwrap();
        assert_eq!(node, Node::Branch(Branch::new()));
    }

    #[test]
    fn tree_root_must_be_object() {
        let err = tree_from_json(json!([1, 2])).unwrap_err();
        assert!(matches!(err, TreeError::NotAnObject { found: "array" }));
    }

    #[test]
    fn json_roundtrip_preserves_shape() {
        let input = json!({
            "a": {"value": 1.5, "statistic": "high"},
            "b": {"World": 2.0},
            "c": {"d": "Linear", "e": true, "f": [1, 2]},
            "g": null
        });
        let tree = tree_from_json(input.clone()).unwrap();
        assert_eq!(branch_to_json(&tree), input);
    }

    #[test]
    fn serde_goes_through_marker_detection() {
        let node: Node = serde_json::from_str(r#"{"value": 11.0}"#).unwrap();
        assert!(matches!(node, Node::Leaf(Leaf::Stat(_))));

        let leaf: Result<Leaf, _> = serde_json::from_str(r#"{"x": 1}"#);
        assert!(leaf.is_err());
    }

    #[test]
    fn display_value_unquotes_text() {
        assert_eq!(Leaf::text("Linear").display_value(), "Linear");
        assert_eq!(Leaf::number(2.0).display_value(), "2.0");
    }
}
