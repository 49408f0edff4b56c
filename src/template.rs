//! `{{ variable }}` interpolation for export definitions
//!
//! Definitions keep secrets and run-specific values out of their text:
//! `{{ config.password }}` reads the user configuration and
//! `{{ vars.timestamp }}` or `{{ vars.batch_id }}` read run variables.
//! A bare `{{ name }}` looks in config first, then vars.

use crate::error::{Error, Result};
use chrono::{DateTime, Local};
use regex::{Captures, Regex};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)*)\s*\}\}")
        .expect("template regex is valid")
});

/// Format of `vars.timestamp`
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Values visible to templates
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    /// User configuration (credentials, connection details)
    pub config: Value,
    /// Run variables
    pub vars: Value,
}

impl TemplateContext {
    /// Context with nothing defined
    pub fn new() -> Self {
        Self::default()
    }

    /// Context with user configuration only
    pub fn with_config(config: Value) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Context for one export run started at `started`
    ///
    /// Exposes `vars.timestamp` and, when known, `vars.batch_id`.
    pub fn for_run(config: Value, started: DateTime<Local>, batch_id: Option<&str>) -> Self {
        let mut vars = json!({ "timestamp": started.format(TIMESTAMP_FORMAT).to_string() });
        if let Some(id) = batch_id {
            vars["batch_id"] = Value::String(id.to_string());
        }
        Self { config, vars }
    }

    /// Value at a dotted path such as `config.credentials.user`
    pub fn get(&self, path: &str) -> Option<&Value> {
        let parts: Vec<&str> = path.split('.').collect();
        match parts.split_first() {
            Some((&"config", rest)) => lookup(&self.config, rest),
            Some((&"vars", rest)) => lookup(&self.vars, rest),
            _ => lookup(&self.config, &parts).or_else(|| lookup(&self.vars, &parts)),
        }
    }
}

fn lookup<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(root, |current, key| current.as_object()?.get(*key))
}

/// Render a template string
///
/// Every undefined variable is named in the error.
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    let mut undefined = Vec::new();

    let rendered = TEMPLATE_REGEX.replace_all(template, |cap: &Captures<'_>| {
        match ctx.get(&cap[1]) {
            Some(value) => substitution(value),
            None => {
                undefined.push(cap[1].to_string());
                String::new()
            }
        }
    });

    if undefined.is_empty() {
        Ok(rendered.into_owned())
    } else {
        Err(Error::undefined_var(undefined.join(", ")))
    }
}

/// Render every string, and every object key, inside a JSON value
pub fn render_value(value: &Value, ctx: &TemplateContext) -> Result<Value> {
    Ok(match value {
        Value::String(s) if has_templates(s) => Value::String(render(s, ctx)?),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| render_value(item, ctx))
                .collect::<Result<_>>()?,
        ),
        Value::Object(map) => {
            let mut rendered = serde_json::Map::with_capacity(map.len());
            for (key, item) in map {
                let key = if has_templates(key) {
                    render(key, ctx)?
                } else {
                    key.clone()
                };
                rendered.insert(key, render_value(item, ctx)?);
            }
            Value::Object(rendered)
        }
        other => other.clone(),
    })
}

/// Whether a string contains a template variable
pub fn has_templates(s: &str) -> bool {
    TEMPLATE_REGEX.is_match(s)
}

/// Variable paths referenced by a template, in order of appearance
pub fn extract_variables(template: &str) -> Vec<String> {
    TEMPLATE_REGEX
        .captures_iter(template)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Top-level `config` keys referenced anywhere inside a JSON value, sorted
pub fn config_keys(value: &Value) -> Vec<String> {
    fn visit(value: &Value, keys: &mut BTreeSet<String>) {
        match value {
            Value::String(s) => keys.extend(
                extract_variables(s)
                    .iter()
                    .filter_map(|var| var.strip_prefix("config."))
                    .filter_map(|rest| rest.split('.').next())
                    .map(String::from),
            ),
            Value::Array(items) => items.iter().for_each(|item| visit(item, keys)),
            Value::Object(map) => map.values().for_each(|item| visit(item, keys)),
            _ => {}
        }
    }

    let mut keys = BTreeSet::new();
    visit(value, &mut keys);
    keys.into_iter().collect()
}

fn substitution(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
