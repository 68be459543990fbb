//! Record shapes that flow through the ingest pipeline.
//!
//! ```text
//! line ──tokenize──▶ Vec<String> ──zip headers──▶ FlatRecord
//!      ──expand dots──▶ StructuredRecord ──normalize──▶ PersistableRecord
//! ```

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ── Scalar values ─────────────────────────────────────────────

/// A single cell value after type coercion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Coerce raw cell text into a typed value.
    ///
    /// The text is trimmed first. Integers win over floats, so `"007"` is `Integer(7)`.
    /// Non-finite floats (`NaN`, `inf`) stay text because they have no JSON form.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return FieldValue::Text(trimmed.to_string());
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return FieldValue::Integer(i);
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() => FieldValue::Float(f),
            _ => FieldValue::Text(trimmed.to_string()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Integer(i) => serde_json::Value::from(*i),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

// ── Flat rows ─────────────────────────────────────────────────

/// One parsed data line keyed by header name, in header order.
pub type FlatRecord = IndexMap<String, FieldValue>;

// ── Structured rows ───────────────────────────────────────────

/// Children of an object node, in first-seen key order.
pub type Tree = IndexMap<String, Node>;

/// A node of a [`StructuredRecord`]: either a scalar leaf or a nested object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Node {
    Value(FieldValue),
    Object(Tree),
}

impl Node {
    pub fn as_value(&self) -> Option<&FieldValue> {
        match self {
            Node::Value(v) => Some(v),
            Node::Object(_) => None,
        }
    }

    pub fn as_object(&self) -> Option<&Tree> {
        match self {
            Node::Object(t) => Some(t),
            Node::Value(_) => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Node::Value(v) => v.to_json(),
            Node::Object(tree) => tree_to_json(tree),
        }
    }
}

pub fn tree_to_json(tree: &Tree) -> serde_json::Value {
    serde_json::Value::Object(
        tree.iter()
            .map(|(k, node)| (k.clone(), node.to_json()))
            .collect(),
    )
}

/// A flat record with its dotted keys expanded into nested objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StructuredRecord {
    pub root: Tree,
}

impl StructuredRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.root.get(key)
    }

    /// Follow a path of keys through nested objects.
    pub fn get_path(&self, path: &[&str]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.root.get(*first)?;
        for key in rest {
            node = node.as_object()?.get(*key)?;
        }
        Some(node)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        tree_to_json(&self.root)
    }
}

// ── Persistable rows ──────────────────────────────────────────

/// The four-column shape written to the `users` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistableRecord {
    pub name: String,
    pub age: i32,
    pub address: Option<serde_json::Value>,
    pub additional_info: Option<serde_json::Value>,
}
