//! Ranged document tree.
//!
//! The model builder never talks to a concrete document parser. Input
//! arrives as a [`Node`] tree - a closed union of the four shapes any
//! YAML/JSON-like parser produces - with every node carrying the byte range
//! it was read from. Hosts with span-aware parsers construct these trees
//! directly; [`from_json`] is the reference adapter for hosts that only have
//! a `serde_json::Value`.

use serde::Serialize;
use thiserror::Error;

/// Byte range `[start, end)` into the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

impl Range {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Create a range that covers both self and other
    pub fn merge(&self, other: &Range) -> Range {
        Range {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A value with the range it was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ranged<T> {
    pub node: T,
    pub range: Range,
}

impl<T> Ranged<T> {
    pub fn new(node: T, range: Range) -> Self {
        Self { node, range }
    }
}

/// Scalar payloads a document can carry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl ScalarValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view; floats with a zero fraction count.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ScalarValue::Int(i) => Some(*i),
            ScalarValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ScalarValue::Int(i) => Some(*i as f64),
            ScalarValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

/// One node of the parsed document.
///
/// This is a closed union: a map, a sequence, a scalar, or `Missing` - the
/// placeholder a lookup returns when a key is absent, carrying the range of
/// the enclosing node so diagnostics still have an anchor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Node {
    Map {
        entries: Vec<(Ranged<String>, Node)>,
        range: Range,
    },
    Seq {
        items: Vec<Node>,
        range: Range,
    },
    Scalar {
        value: ScalarValue,
        range: Range,
    },
    Missing {
        range: Range,
    },
}

impl Node {
    pub fn is_map(&self) -> bool {
        matches!(self, Node::Map { .. })
    }

    pub fn is_seq(&self) -> bool {
        matches!(self, Node::Seq { .. })
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Node::Scalar { .. })
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Node::Missing { .. })
    }

    pub fn range(&self) -> Range {
        match self {
            Node::Map { range, .. }
            | Node::Seq { range, .. }
            | Node::Scalar { range, .. }
            | Node::Missing { range } => *range,
        }
    }

    /// Look up a key in a map node.
    ///
    /// Returns `None` for absent keys and for non-map nodes; use [`Node::req`]
    /// when a `Missing` placeholder is the more useful answer.
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Map { entries, .. } => entries
                .iter()
                .find(|(k, _)| k.node == key)
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Look up a key, falling back to a `Missing` node anchored at this
    /// node's range.
    pub fn req(&self, key: &str) -> Node {
        self.get(key)
            .cloned()
            .unwrap_or(Node::Missing { range: self.range() })
    }

    /// Items of a sequence node; empty for anything else.
    pub fn items(&self) -> &[Node] {
        match self {
            Node::Seq { items, .. } => items,
            _ => &[],
        }
    }

    /// Map entries; empty for anything else.
    pub fn entries(&self) -> &[(Ranged<String>, Node)] {
        match self {
            Node::Map { entries, .. } => entries,
            _ => &[],
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar { value, .. } => value.as_str(),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            Node::Scalar { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Human-readable node kind for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Map { .. } => "mapping",
            Node::Seq { .. } => "sequence",
            Node::Scalar { .. } => "scalar",
            Node::Missing { .. } => "missing",
        }
    }

    /// Convert the subtree to a plain `serde_json::Value`, losing ranges.
    /// Used for opaque payloads (request bodies, input schemas).
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Node::Map { entries, .. } => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.node.clone(), v.to_json()))
                    .collect(),
            ),
            Node::Seq { items, .. } => {
                serde_json::Value::Array(items.iter().map(Node::to_json).collect())
            }
            Node::Scalar { value, .. } => match value {
                ScalarValue::Str(s) => serde_json::Value::String(s.clone()),
                ScalarValue::Int(i) => serde_json::Value::from(*i),
                ScalarValue::Float(f) => serde_json::Value::from(*f),
                ScalarValue::Bool(b) => serde_json::Value::Bool(*b),
                ScalarValue::Null => serde_json::Value::Null,
            },
            Node::Missing { .. } => serde_json::Value::Null,
        }
    }
}

/// Error loading a document through the JSON adapter.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid JSON document: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Convert a `serde_json::Value` into a [`Node`] tree.
///
/// `serde_json` carries no source spans, so ranges are synthesized in
/// depth-first order: every node's range strictly contains its children's.
/// The offsets are not byte positions in any real file, but they are stable,
/// distinct, and nest correctly, which is what diagnostics and tests need.
pub fn from_json(value: &serde_json::Value) -> Node {
    let mut counter = 0usize;
    convert_json(value, &mut counter)
}

/// Parse a JSON string and convert it, the CLI's input edge.
pub fn load_json(source: &str) -> Result<Node, DocumentError> {
    let value: serde_json::Value = serde_json::from_str(source)?;
    Ok(from_json(&value))
}

fn convert_json(value: &serde_json::Value, counter: &mut usize) -> Node {
    let start = bump(counter);
    match value {
        serde_json::Value::Object(map) => {
            let entries = map
                .iter()
                .map(|(k, v)| {
                    let key_pos = bump(counter);
                    let key = Ranged::new(k.clone(), Range::new(key_pos, key_pos + 1));
                    (key, convert_json(v, counter))
                })
                .collect();
            Node::Map {
                entries,
                range: Range::new(start, bump(counter)),
            }
        }
        serde_json::Value::Array(items) => {
            let items = items.iter().map(|v| convert_json(v, counter)).collect();
            Node::Seq {
                items,
                range: Range::new(start, bump(counter)),
            }
        }
        _ => {
            let value = match value {
                serde_json::Value::String(s) => ScalarValue::Str(s.clone()),
                serde_json::Value::Number(n) => {
                    if let Some(i) = n.as_i64() {
                        ScalarValue::Int(i)
                    } else {
                        ScalarValue::Float(n.as_f64().unwrap_or(f64::NAN))
                    }
                }
                serde_json::Value::Bool(b) => ScalarValue::Bool(*b),
                _ => ScalarValue::Null,
            };
            Node::Scalar {
                value,
                range: Range::new(start, start + 1),
            }
        }
    }
}

fn bump(counter: &mut usize) -> usize {
    let v = *counter;
    *counter += 1;
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_and_items() {
        let node = from_json(&json!({"a": 1, "b": [true, null]}));
        assert!(node.is_map());
        assert_eq!(node.get("a").and_then(Node::as_scalar), Some(&ScalarValue::Int(1)));
        let b = node.get("b").unwrap();
        assert!(b.is_seq());
        assert_eq!(b.items().len(), 2);
        assert!(node.get("c").is_none());
        assert!(node.req("c").is_missing());
    }

    #[test]
    fn test_missing_carries_parent_range() {
        let node = from_json(&json!({"a": 1}));
        assert_eq!(node.req("zzz").range(), node.range());
    }

    #[test]
    fn test_synthetic_ranges_nest() {
        let node = from_json(&json!({"outer": {"inner": "x"}}));
        let outer = node.range();
        let inner = node.get("outer").unwrap().range();
        let leaf = node.get("outer").unwrap().get("inner").unwrap().range();
        assert!(outer.start < inner.start && inner.end <= outer.end);
        assert!(inner.start < leaf.start && leaf.end <= inner.end);
    }

    #[test]
    fn test_ranges_are_distinct() {
        let node = from_json(&json!({"a": "x", "b": "y"}));
        let a = node.get("a").unwrap().range();
        let b = node.get("b").unwrap().range();
        assert_ne!(a, b);
    }

    #[test]
    fn test_load_json_rejects_garbage() {
        assert!(load_json("{nope").is_err());
    }

    #[test]
    fn test_to_json_round_trips_shape() {
        let value = json!({"a": [1, {"b": false}], "c": "s"});
        let node = from_json(&value);
        assert_eq!(node.to_json(), value);
    }
}
