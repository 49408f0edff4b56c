//! Run-mode configuration
//!
//! Two toggles shape every query: whether soft-deleted records are
//! included, and whether one batch or every batch is fetched. They are
//! resolved once per run into `RunOptions` and passed explicitly.

use crate::error::{Error, Result};
use crate::loader::{ExportDefinition, QueryDefinition};
use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

/// Which batches a run covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchScope {
    /// Every record with a non-empty batch identifier
    All,
    /// Only records tagged with this batch identifier
    Single(String),
}

impl fmt::Display for BatchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all batches"),
            Self::Single(id) => write!(f, "batch {id}"),
        }
    }
}

/// Resolved run options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Include records whose deleted flag is set
    pub include_deleted: bool,
    /// Batch scope
    pub scope: BatchScope,
    /// Field holding the deleted flag
    pub deleted_field: String,
}

impl RunOptions {
    /// Options covering every batch, excluding deleted records
    pub fn all_batches() -> Self {
        Self {
            include_deleted: false,
            scope: BatchScope::All,
            deleted_field: default_deleted_field(),
        }
    }

    /// Options covering one batch, excluding deleted records
    pub fn single_batch(id: impl Into<String>) -> Self {
        Self {
            scope: BatchScope::Single(id.into()),
            ..Self::all_batches()
        }
    }

    /// Include deleted records
    #[must_use]
    pub fn with_deleted(mut self, include: bool) -> Self {
        self.include_deleted = include;
        self
    }

    /// Override the deleted-flag field
    #[must_use]
    pub fn with_deleted_field(mut self, field: impl Into<String>) -> Self {
        self.deleted_field = field.into();
        self
    }

    /// Resolve options from the command-line toggles and a definition
    ///
    /// `fetch_all` selects every batch. Otherwise the batch id comes from
    /// `batch_id`, falling back to the definition's default; having neither
    /// is a configuration error.
    pub fn resolve(
        fetch_all: bool,
        include_deleted: bool,
        batch_id: Option<&str>,
        def: &ExportDefinition,
    ) -> Result<Self> {
        let scope = if fetch_all {
            BatchScope::All
        } else {
            let id = batch_id
                .or(def.run.batch_id.as_deref())
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .ok_or_else(|| {
                    Error::config(
                        "No batch id: pass --batch-id, set run.batch_id, or use --fetch-all",
                    )
                })?;
            BatchScope::Single(id.to_string())
        };

        Ok(Self {
            include_deleted,
            scope,
            deleted_field: def.run.deleted_field.clone(),
        })
    }
}

fn default_deleted_field() -> String {
    "isDeleted".to_string()
}

/// Filter clause for the deleted flag
pub fn liveness_clause(include_deleted: bool) -> JsonValue {
    if include_deleted {
        json!({ "$in": [true, false] })
    } else {
        JsonValue::Bool(false)
    }
}

/// Filter clause for the batch field
pub fn batch_clause(scope: &BatchScope) -> JsonValue {
    match scope {
        BatchScope::All => json!({ "$nin": ["", null] }),
        BatchScope::Single(id) => json!({ "$in": [id] }),
    }
}

/// Effective filter for a query group under the given options
///
/// Starts from the group's own filter; the run toggles overwrite their
/// fields. The definition is not modified.
pub fn resolve_filter(query: &QueryDefinition, options: &RunOptions) -> JsonObject {
    let mut filter = query.filter.clone();

    if let Some(field) = &query.batch_field {
        filter.insert(field.clone(), batch_clause(&options.scope));
    }

    if query.liveness {
        filter.insert(
            options.deleted_field.clone(),
            liveness_clause(options.include_deleted),
        );
    }

    filter
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_definition_from_str;
    use pretty_assertions::assert_eq;

    fn query(batch_field: Option<&str>, liveness: bool) -> QueryDefinition {
        QueryDefinition {
            name: "Forms".to_string(),
            collection: "form_1".to_string(),
            filter: json!({"riskAssessmentType.code": "3"})
                .as_object()
                .cloned()
                .unwrap_or_default(),
            projection: vec![],
            batch_field: batch_field.map(String::from),
            liveness,
        }
    }

    fn definition(batch_id: Option<&str>) -> ExportDefinition {
        let run = batch_id
            .map(|id| format!("run:\n  batch_id: \"{id}\"\n  deleted_field: removed\n"))
            .unwrap_or_default();
        let yaml = format!(
            "name: t\nsource:\n  connection_string: mongodb://x\n  database: d\n{run}queries:\n  - name: Forms\n    collection: f\n"
        );
        load_definition_from_str(&yaml).unwrap()
    }

    #[test]
    fn test_default_single_batch_excludes_deleted() {
        let options = RunOptions::single_batch("76d6d840");
        let filter = resolve_filter(&query(Some("bulkprocessId"), true), &options);

        assert_eq!(
            JsonValue::Object(filter),
            json!({
                "riskAssessmentType.code": "3",
                "bulkprocessId": {"$in": ["76d6d840"]},
                "isDeleted": false
            })
        );
    }

    #[test]
    fn test_all_batches_with_deleted() {
        let options = RunOptions::all_batches().with_deleted(true);
        let filter = resolve_filter(&query(Some("bulkprocessId"), true), &options);

        assert_eq!(filter["bulkprocessId"], json!({"$nin": ["", null]}));
        assert_eq!(filter["isDeleted"], json!({"$in": [true, false]}));
    }

    #[test]
    fn test_query_without_batch_field() {
        let filter = resolve_filter(&query(None, true), &RunOptions::all_batches());
        assert!(!filter.contains_key("bulkprocessId"));
        assert_eq!(filter["isDeleted"], json!(false));
    }

    #[test]
    fn test_query_without_liveness() {
        let filter = resolve_filter(&query(Some("b"), false), &RunOptions::all_batches());
        assert!(!filter.contains_key("isDeleted"));
    }

    #[test]
    fn test_resolve_filter_leaves_definition_untouched() {
        let q = query(Some("bulkprocessId"), true);
        let before = q.filter.clone();
        let _ = resolve_filter(&q, &RunOptions::all_batches());
        assert_eq!(q.filter, before);
    }

    #[test]
    fn test_toggles_overwrite_base_filter() {
        let mut q = query(Some("bulkprocessId"), true);
        q.filter.insert("isDeleted".to_string(), json!(true));

        let filter = resolve_filter(&q, &RunOptions::all_batches());
        assert_eq!(filter["isDeleted"], json!(false));
    }

    #[test]
    fn test_custom_deleted_field() {
        let options = RunOptions::all_batches().with_deleted_field("removed");
        let filter = resolve_filter(&query(None, true), &options);
        assert_eq!(filter["removed"], json!(false));
        assert!(!filter.contains_key("isDeleted"));
    }

    #[test]
    fn test_resolve_fetch_all_ignores_batch_id() {
        let def = definition(None);
        let options = RunOptions::resolve(true, false, Some("ignored"), &def).unwrap();
        assert_eq!(options.scope, BatchScope::All);
    }

    #[test]
    fn test_resolve_cli_batch_id_wins() {
        let def = definition(Some("from-def"));
        let options = RunOptions::resolve(false, true, Some("from-cli"), &def).unwrap();

        assert_eq!(options.scope, BatchScope::Single("from-cli".to_string()));
        assert!(options.include_deleted);
        assert_eq!(options.deleted_field, "removed");
    }

    #[test]
    fn test_resolve_falls_back_to_definition() {
        let def = definition(Some("from-def"));
        let options = RunOptions::resolve(false, false, None, &def).unwrap();
        assert_eq!(options.scope, BatchScope::Single("from-def".to_string()));
    }

    #[test]
    fn test_resolve_without_batch_id_fails() {
        let def = definition(None);
        let err = RunOptions::resolve(false, false, None, &def).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_resolve_blank_batch_id_fails() {
        let def = definition(None);
        assert!(RunOptions::resolve(false, false, Some("  "), &def).is_err());
    }

    #[test]
    fn test_batch_scope_display() {
        assert_eq!(BatchScope::All.to_string(), "all batches");
        assert_eq!(BatchScope::Single("x".into()).to_string(), "batch x");
    }
}
