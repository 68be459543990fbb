//! Structured record → `users` table row.

use roster_core::{tree_to_json, FieldValue, Node, PersistableRecord, StructuredRecord, Tree};
use thiserror::Error;

/// Top-level keys that map to dedicated columns; everything else lands in `additional_info`.
const RESERVED_KEYS: &[&str] = &["name", "age", "address"];

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("record {index}: age {value:?} is not a whole number in the INTEGER range")]
    InvalidAge { index: usize, value: String },
}

/// Derive the persisted columns from a structured record.
pub fn normalize(record: &StructuredRecord) -> Result<PersistableRecord, NormalizeError> {
    normalize_indexed(record, 0)
}

/// Normalize every record, reporting the 1-based position of the first failure.
pub fn normalize_all(records: &[StructuredRecord]) -> Result<Vec<PersistableRecord>, NormalizeError> {
    records
        .iter()
        .enumerate()
        .map(|(i, rec)| normalize_indexed(rec, i + 1))
        .collect()
}

fn normalize_indexed(record: &StructuredRecord, index: usize) -> Result<PersistableRecord, NormalizeError> {
    let first_name = name_part(record, "firstName");
    let last_name = name_part(record, "lastName");
    let name = format!("{} {}", first_name, last_name).trim().to_string();

    let age = extract_age(record.get("age"), index)?;

    let address = record.get("address").and_then(|node| match node {
        Node::Value(FieldValue::Text(s)) if s.is_empty() => None,
        other => Some(other.to_json()),
    });

    let residual: Tree = record
        .root
        .iter()
        .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
        .map(|(key, node)| (key.clone(), node.clone()))
        .collect();
    let additional_info = (!residual.is_empty()).then(|| tree_to_json(&residual));

    Ok(PersistableRecord {
        name,
        age,
        address,
        additional_info,
    })
}

fn name_part(record: &StructuredRecord, part: &str) -> String {
    record
        .get_path(&["name", part])
        .and_then(Node::as_value)
        .map(FieldValue::to_string)
        .unwrap_or_default()
}

/// Missing or blank ages become 0. Whole floats (`30.0`) are accepted.
fn extract_age(node: Option<&Node>, index: usize) -> Result<i32, NormalizeError> {
    let invalid = |value: String| NormalizeError::InvalidAge { index, value };
    match node {
        None => Ok(0),
        Some(Node::Value(FieldValue::Text(s))) if s.trim().is_empty() => Ok(0),
        Some(Node::Value(FieldValue::Integer(i))) => {
            i32::try_from(*i).map_err(|_| invalid(i.to_string()))
        }
        Some(Node::Value(FieldValue::Float(f))) => {
            if f.fract() == 0.0 && *f >= i32::MIN as f64 && *f <= i32::MAX as f64 {
                Ok(*f as i32)
            } else {
                Err(invalid(f.to_string()))
            }
        }
        Some(other) => Err(invalid(other.to_json().to_string())),
    }
}
