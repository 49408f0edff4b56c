//! In-memory document source
//!
//! Holds collections in process. Filters support plain equality plus the
//! `$in`, `$nin` and `$ne` operators on dotted paths, which covers every
//! filter the run toggles produce. Inclusion projections are honored.

use super::{DocumentSource, SourceQuery};
use crate::error::{Error, Result};
use async_trait::async_trait;
use mongodb::bson::{Bson, Document};
use std::collections::HashMap;
use std::sync::Mutex;

/// Document source backed by in-memory collections
#[derive(Debug, Default)]
pub struct MemorySource {
    collections: HashMap<String, Vec<Document>>,
    failing: HashMap<String, String>,
    queries: Mutex<Vec<SourceQuery>>,
}

impl MemorySource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a collection
    #[must_use]
    pub fn with_collection(mut self, name: impl Into<String>, documents: Vec<Document>) -> Self {
        self.collections.insert(name.into(), documents);
        self
    }

    /// Make every query against a collection fail with `message`
    #[must_use]
    pub fn with_failure(mut self, name: impl Into<String>, message: impl Into<String>) -> Self {
        self.failing.insert(name.into(), message.into());
        self
    }

    /// Queries received so far, in order
    pub fn queries(&self) -> Vec<SourceQuery> {
        self.queries
            .lock()
            .map(|queries| queries.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentSource for MemorySource {
    fn describe(&self) -> String {
        format!("in-memory source ({} collections)", self.collections.len())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn find(&self, query: &SourceQuery) -> Result<Vec<Document>> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.clone());
        }

        if let Some(message) = self.failing.get(&query.collection) {
            return Err(Error::Other(message.clone()));
        }

        let Some(documents) = self.collections.get(&query.collection) else {
            return Ok(Vec::new());
        };

        let mut matched = Vec::new();
        for document in documents {
            if matches_filter(document, &query.filter)? {
                matched.push(match &query.projection {
                    Some(projection) => project(document, projection),
                    None => document.clone(),
                });
            }
        }
        Ok(matched)
    }
}

fn matches_filter(document: &Document, filter: &Document) -> Result<bool> {
    for (path, condition) in filter {
        let value = lookup(document, path);
        if !matches_condition(value, condition)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn matches_condition(value: Option<&Bson>, condition: &Bson) -> Result<bool> {
    let Bson::Document(ops) = condition else {
        return Ok(equals(value, condition));
    };
    if !ops.keys().all(|k| k.starts_with('$')) {
        return Ok(equals(value, condition));
    }

    for (op, operand) in ops {
        let ok = match op.as_str() {
            "$in" => operand_list(op, operand)?.iter().any(|c| equals(value, c)),
            "$nin" => !operand_list(op, operand)?.iter().any(|c| equals(value, c)),
            "$ne" => !equals(value, operand),
            "$eq" => equals(value, operand),
            other => {
                return Err(Error::config(format!(
                    "In-memory source does not support operator '{other}'"
                )))
            }
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn operand_list<'a>(op: &str, operand: &'a Bson) -> Result<&'a [Bson]> {
    match operand {
        Bson::Array(items) => Ok(items),
        _ => Err(Error::config(format!("Operator '{op}' needs an array"))),
    }
}

// An absent field equals null, as in the store
fn equals(value: Option<&Bson>, expected: &Bson) -> bool {
    match value {
        Some(v) => v == expected,
        None => matches!(expected, Bson::Null),
    }
}

fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let mut current = document.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Bson::Document(inner) => inner.get(part)?,
            _ => return None,
        };
    }
    Some(current)
}

fn project(document: &Document, projection: &Document) -> Document {
    let mut out = Document::new();
    if let Some(id) = document.get("_id") {
        out.insert("_id", id.clone());
    }
    for (path, include) in projection {
        if matches!(include, Bson::Int32(0) | Bson::Int64(0) | Bson::Boolean(false)) {
            continue;
        }
        if let Some(value) = lookup(document, path) {
            insert_path(&mut out, path, value.clone());
        }
    }
    out
}

fn insert_path(target: &mut Document, path: &str, value: Bson) {
    match path.split_once('.') {
        None => {
            target.insert(path, value);
        }
        Some((head, rest)) => {
            if !matches!(target.get(head), Some(Bson::Document(_))) {
                target.insert(head, Document::new());
            }
            if let Some(Bson::Document(inner)) = target.get_mut(head) {
                insert_path(inner, rest, value);
            }
        }
    }
}
