//! Path flattener
//!
//! Collapses nested mappings into a single-level mapping keyed by
//! separator-joined paths. Arrays are stored as-is under their path;
//! expanding them is the table's job.

use crate::error::{Error, Result};
use crate::types::{json_type_name, JsonObject, JsonValue};

/// Default path separator
pub const DEFAULT_SEPARATOR: &str = ".";

/// A single-level record keyed by path, in first-seen order
pub type FlatRecord = JsonObject;

/// Flatten one object into a path-keyed record
pub fn flatten_object(object: &JsonObject, separator: &str) -> FlatRecord {
    let mut flat = FlatRecord::new();
    flatten_into(&mut flat, "", object, separator);
    flat
}

/// Flatten an object whose paths all start with `prefix`
///
/// Used when an exploded array element is itself a mapping: its keys become
/// sub-paths of the array column.
pub fn flatten_with_prefix(prefix: &str, object: &JsonObject, separator: &str) -> FlatRecord {
    let mut flat = FlatRecord::new();
    flatten_into(&mut flat, prefix, object, separator);
    flat
}

/// Flatten a single record, rejecting anything that is not a mapping
pub fn flatten_record(record: &JsonValue, separator: &str) -> Result<FlatRecord> {
    flatten_at(0, record, separator)
}

/// Flatten a batch of records, preserving batch order
pub fn flatten_batch(records: &[JsonValue], separator: &str) -> Result<Vec<FlatRecord>> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| flatten_at(index, record, separator))
        .collect()
}

fn flatten_at(index: usize, record: &JsonValue, separator: &str) -> Result<FlatRecord> {
    match record {
        JsonValue::Object(object) => Ok(flatten_object(object, separator)),
        other => Err(Error::invalid_record(index, json_type_name(other))),
    }
}

fn flatten_into(out: &mut FlatRecord, parent: &str, object: &JsonObject, separator: &str) {
    for (key, value) in object {
        let path = if parent.is_empty() {
            key.clone()
        } else {
            format!("{parent}{separator}{key}")
        };

        match value {
            // An empty mapping contributes no path
            JsonValue::Object(child) => flatten_into(out, &path, child, separator),
            other => {
                out.insert(path, other.clone());
            }
        }
    }
}
