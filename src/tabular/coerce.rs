//! BSON to JSON coercion
//!
//! Document-store records can carry types a spreadsheet cell cannot hold
//! (object ids, dates, decimals, binary, ...). Those are turned into strings
//! before flattening. Each coercion is recorded and logged once per path.

use crate::types::{JsonObject, JsonValue};
use mongodb::bson::{Bson, Document};
use serde_json::Number;
use std::collections::HashSet;
use tracing::warn;

/// Summary of values coerced to strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoercionReport {
    /// Number of values coerced
    pub coerced: usize,
    /// Distinct paths where coercion happened, first-seen order
    pub paths: Vec<String>,
    seen: HashSet<String>,
}

impl CoercionReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether nothing was coerced
    pub fn is_empty(&self) -> bool {
        self.coerced == 0
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: CoercionReport) {
        self.coerced += other.coerced;
        for path in other.paths {
            if self.seen.insert(path.clone()) {
                self.paths.push(path);
            }
        }
    }

    fn record(&mut self, path: &str, kind: &str) {
        self.coerced += 1;
        if self.seen.insert(path.to_string()) {
            warn!(path, kind, "unrepresentable value coerced to string");
            self.paths.push(path.to_string());
        }
    }
}

/// Convert one BSON document into a JSON object
///
/// The input is left untouched.
pub fn coerce_document(document: &Document, report: &mut CoercionReport) -> JsonObject {
    coerce_document_at(document, "", report)
}

/// Convert a batch of documents
pub fn coerce_documents(documents: &[Document], report: &mut CoercionReport) -> Vec<JsonValue> {
    documents
        .iter()
        .map(|doc| JsonValue::Object(coerce_document(doc, report)))
        .collect()
}

fn coerce_document_at(document: &Document, parent: &str, report: &mut CoercionReport) -> JsonObject {
    let mut object = JsonObject::new();
    for (key, value) in document {
        let path = if parent.is_empty() {
            key.clone()
        } else {
            format!("{parent}.{key}")
        };
        object.insert(key.clone(), coerce_bson(value, &path, report));
    }
    object
}

/// Convert one BSON value; `path` names its position for reporting
pub fn coerce_bson(value: &Bson, path: &str, report: &mut CoercionReport) -> JsonValue {
    match value {
        Bson::Null => JsonValue::Null,
        Bson::Boolean(b) => JsonValue::Bool(*b),
        Bson::Int32(i) => JsonValue::Number((*i).into()),
        Bson::Int64(i) => JsonValue::Number((*i).into()),
        Bson::Double(f) => match Number::from_f64(*f) {
            Some(n) => JsonValue::Number(n),
            None => {
                report.record(path, "double");
                JsonValue::String(f.to_string())
            }
        },
        Bson::String(s) => JsonValue::String(s.clone()),
        // Array elements share the array's path
        Bson::Array(items) => JsonValue::Array(
            items
                .iter()
                .map(|item| coerce_bson(item, path, report))
                .collect(),
        ),
        Bson::Document(doc) => JsonValue::Object(coerce_document_at(doc, path, report)),
        Bson::ObjectId(oid) => {
            report.record(path, "objectId");
            JsonValue::String(oid.to_hex())
        }
        Bson::DateTime(dt) => {
            report.record(path, "date");
            JsonValue::String(dt.try_to_rfc3339_string().unwrap_or_else(|_| dt.to_string()))
        }
        other => {
            let kind = format!("{:?}", other.element_type());
            report.record(path, &kind);
            JsonValue::String(other.to_string())
        }
    }
}
