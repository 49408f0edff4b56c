//! JSON and JSON-lines decoders

use super::types::{DecoderFormat, RecordDecoder};
use crate::error::{Error, Result};
use serde_json::Value;

/// Decoder for `format`; `record_path` only applies to JSON bodies
pub fn decoder_for(format: DecoderFormat, record_path: Option<&str>) -> Box<dyn RecordDecoder> {
    match (format, record_path) {
        (DecoderFormat::Json, Some(path)) => Box::new(JsonDecoder::with_path(path)),
        (DecoderFormat::Json, None) => Box::new(JsonDecoder::new()),
        (DecoderFormat::Jsonl, _) => Box::new(JsonlDecoder),
    }
}

/// A single JSON document holding the records
///
/// Without a path, a top-level array yields its elements and anything else
/// is one record. With a path, an unresolved or null target yields nothing.
#[derive(Debug, Clone, Default)]
pub struct JsonDecoder {
    record_path: Option<String>,
}

impl JsonDecoder {
    /// Records are the whole document
    pub fn new() -> Self {
        Self::default()
    }

    /// Records live at `path`
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            record_path: Some(path.into()),
        }
    }

    /// Pull the records out of a parsed document
    pub fn extract_records(&self, document: &Value) -> Result<Vec<Value>> {
        let target = match self.record_path.as_deref() {
            Some(path) if path.contains('*') => return select_jsonpath(document, path),
            Some(path) => value_at(document, path),
            None => Some(document),
        };

        Ok(match target {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(other) => vec![other.clone()],
        })
    }
}

impl RecordDecoder for JsonDecoder {
    fn decode(&self, body: &str) -> Result<Vec<Value>> {
        let document: Value = serde_json::from_str(body)
            .map_err(|e| Error::decode(format!("Invalid JSON: {e}")))?;
        self.extract_records(&document)
    }
}

/// One JSON value per non-blank line
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonlDecoder;

impl RecordDecoder for JsonlDecoder {
    fn decode(&self, body: &str) -> Result<Vec<Value>> {
        body.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str(line)
                    .map_err(|e| Error::decode(format!("Invalid JSON on line {}: {e}", idx + 1)))
            })
            .collect()
    }
}

/// Value at a dotted path, with optional `[n]` indexing
///
/// A leading `$.` is ignored. Negative indices count from the end.
pub fn value_at<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);

    path.split('.').try_fold(value, |current, segment| {
        let Some((name, index)) = segment.split_once('[') else {
            return current.get(segment);
        };

        let current = if name.is_empty() {
            current
        } else {
            current.get(name)?
        };
        let index: i64 = index.strip_suffix(']')?.parse().ok()?;
        let items = current.as_array()?;
        let position = if index < 0 {
            items.len().checked_sub(index.unsigned_abs() as usize)?
        } else {
            usize::try_from(index).ok()?
        };
        items.get(position)
    })
}

/// Full JSONPath selection, for wildcard paths
fn select_jsonpath(document: &Value, path: &str) -> Result<Vec<Value>> {
    use jsonpath_rust::JsonPath;

    let query = JsonPath::try_from(path)
        .map_err(|e| Error::json_path(format!("Invalid JSONPath '{path}': {e}")))?;

    Ok(match query.find(document) {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        other => vec![other],
    })
}
