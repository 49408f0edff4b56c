//! YAML parser for export definitions
//!
//! Parses and validates export YAML files.
//! Supports both built-in definitions (by name) and custom YAML files (by path).

use crate::definitions;
use crate::error::{Error, Result};
use crate::loader::types::{
    AugmentationDefinition, AuthDefinition, ExportDefinition, QueryDefinition,
};
use crate::template::has_templates;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Load an export definition from a name or file path
///
/// A bare name (no path separators, no YAML extension) is looked up among
/// the built-in definitions first.
///
/// # Examples
///
/// ```ignore
/// let def = load_definition("relationship-migration")?;
/// let def = load_definition("./my-export.yaml")?;
/// ```
pub fn load_definition(path: impl AsRef<Path>) -> Result<ExportDefinition> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy();

    if !path_str.contains('/')
        && !path_str.contains('\\')
        && !path_str.ends_with(".yaml")
        && !path_str.ends_with(".yml")
    {
        if let Some(yaml) = definitions::get_builtin(&path_str) {
            return load_definition_from_str(yaml);
        }
    }

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            let builtin_list = definitions::list_builtin().join(", ");
            Error::config(format!(
                "Definition '{}' not found. Built-in definitions: {}. Or provide a path to a YAML file.",
                path.display(),
                builtin_list
            ))
        } else {
            Error::config(format!(
                "Failed to read definition file '{}': {}",
                path.display(),
                e
            ))
        }
    })?;
    load_definition_from_str(&content)
}

/// Load an export definition from a YAML string
pub fn load_definition_from_str(yaml: &str) -> Result<ExportDefinition> {
    let def: ExportDefinition = serde_yaml::from_str(yaml)
        .map_err(|e| Error::config(format!("Failed to parse definition YAML: {e}")))?;

    validate_definition(&def)?;
    Ok(def)
}

/// Validate an export definition
pub fn validate_definition(def: &ExportDefinition) -> Result<()> {
    if def.name.trim().is_empty() {
        return Err(Error::config("Definition name cannot be empty"));
    }

    if def.source.connection_string.trim().is_empty() {
        return Err(Error::missing_field("source.connection_string"));
    }

    if def.source.database.trim().is_empty() {
        return Err(Error::missing_field("source.database"));
    }

    if def.run.deleted_field.trim().is_empty() {
        return Err(Error::invalid_value("run.deleted_field", "cannot be empty"));
    }

    if def.tabular.separator.is_empty() {
        return Err(Error::invalid_value("tabular.separator", "cannot be empty"));
    }

    if def.tabular.max_depth == 0 {
        return Err(Error::invalid_value("tabular.max_depth", "must be at least 1"));
    }

    if def.queries.is_empty() {
        return Err(Error::config("Definition must have at least one query"));
    }

    let names: HashSet<&str> = def.queries.iter().map(|q| q.name.as_str()).collect();
    if names.len() != def.queries.len() {
        return Err(Error::config("Duplicate query names found"));
    }

    for query in &def.queries {
        validate_query(query)?;
    }

    if let Some(augmentation) = &def.augmentation {
        validate_augmentation(augmentation, def)?;
    }

    Ok(())
}

/// Validate a query group
fn validate_query(query: &QueryDefinition) -> Result<()> {
    if query.name.trim().is_empty() {
        return Err(Error::config("Query name cannot be empty"));
    }

    if query.collection.trim().is_empty() {
        return Err(Error::config(format!(
            "Query '{}' collection cannot be empty",
            query.name
        )));
    }

    if query
        .batch_field
        .as_deref()
        .is_some_and(|field| field.trim().is_empty())
    {
        return Err(Error::config(format!(
            "Query '{}' batch_field cannot be empty",
            query.name
        )));
    }

    if let Some(field) = query.projection.iter().find(|f| f.trim().is_empty()) {
        return Err(Error::config(format!(
            "Query '{}' has an empty projection field '{field}'",
            query.name
        )));
    }

    Ok(())
}

/// Validate the augmentation block against the query groups
fn validate_augmentation(aug: &AugmentationDefinition, def: &ExportDefinition) -> Result<()> {
    if aug.sheet.trim().is_empty() {
        return Err(Error::config("Augmentation sheet cannot be empty"));
    }

    if def.query(&aug.correlation.query).is_none() {
        return Err(Error::config(format!(
            "Augmentation correlation query '{}' is not defined",
            aug.correlation.query
        )));
    }

    if aug.correlation.column.trim().is_empty() {
        return Err(Error::config("Augmentation correlation column cannot be empty"));
    }

    if aug.request.ids_path.trim().is_empty() {
        return Err(Error::config("Augmentation ids_path cannot be empty"));
    }

    validate_url("augmentation.request.url", &aug.request.url)?;
    if let AuthDefinition::Session { login_url, .. } = &aug.auth {
        validate_url("augmentation.auth.login_url", login_url)?;
    }

    Ok(())
}

/// Check a URL unless it is filled in from a template at run time
pub(crate) fn validate_url(field: &str, value: &str) -> Result<()> {
    if has_templates(value) {
        return Ok(());
    }
    url::Url::parse(value).map_err(|e| Error::invalid_value(field, e.to_string()))?;
    Ok(())
}
