//! Augmentation fetch
//!
//! Renders the augmentation definition against the run context, exchanges
//! credentials when configured, then posts the identifier set and decodes
//! the returned records.

use super::keys::CorrelationKeys;
use crate::auth::{AuthConfig, SessionLogin};
use crate::decode::JsonDecoder;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RateLimiterConfig};
use crate::loader::{AuthDefinition, AugmentationDefinition};
use crate::template::{render, render_value, TemplateContext};
use crate::types::{JsonValue, Method};
use std::time::Duration;
use tracing::{debug, info};

/// Client for the external augmentation service
#[derive(Debug)]
pub struct AugmentationClient {
    http: HttpClient,
    method: Method,
    url: String,
    body: JsonValue,
    ids_path: String,
    decoder: JsonDecoder,
}

impl AugmentationClient {
    /// Build a client from a definition, rendering every template in it
    pub fn from_definition(def: &AugmentationDefinition, ctx: &TemplateContext) -> Result<Self> {
        let url = render(&def.request.url, ctx).map_err(augmentation_error)?;
        let body = render_value(&def.request.body, ctx).map_err(augmentation_error)?;
        let auth = auth_config(&def.auth, ctx).map_err(augmentation_error)?;

        let mut builder = HttpClientConfig::builder()
            .timeout(Duration::from_secs(def.http.timeout_secs))
            .max_retries(def.http.max_retries);
        builder = match def.http.rate_limit_rps {
            Some(rps) => builder.rate_limit(RateLimiterConfig::per_second(rps)),
            None => builder.no_rate_limit(),
        };

        let http = HttpClient::with_auth(builder.build(), auth).map_err(augmentation_error)?;
        let decoder = match &def.records_path {
            Some(path) => JsonDecoder::with_path(path),
            None => JsonDecoder::new(),
        };

        Ok(Self {
            http,
            method: def.request.method,
            url,
            body,
            ids_path: def.request.ids_path.clone(),
            decoder,
        })
    }

    /// Rendered request URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Request body with the identifier set in place
    pub fn request_body(&self, keys: &CorrelationKeys) -> Result<JsonValue> {
        let mut body = self.body.clone();
        insert_at_path(&mut body, &self.ids_path, keys.to_json())?;
        Ok(body)
    }

    /// Fetch the augmentation records for `keys`
    pub async fn fetch(&self, keys: &CorrelationKeys) -> Result<Vec<JsonValue>> {
        let body = self.request_body(keys).map_err(augmentation_error)?;
        debug!(url = %self.url, keys = keys.len(), "requesting augmentation records");

        let response: JsonValue = self
            .http
            .request_json(self.method.into(), &self.url, &body)
            .await
            .map_err(augmentation_error)?;

        let records = self
            .decoder
            .extract_records(&response)
            .map_err(augmentation_error)?;
        info!(records = records.len(), "augmentation records received");
        Ok(records)
    }
}

fn augmentation_error(err: Error) -> Error {
    match err {
        Error::Augmentation { .. } => err,
        other => Error::augmentation(other.to_string()),
    }
}

/// Render an auth definition into a runtime auth configuration
pub fn auth_config(def: &AuthDefinition, ctx: &TemplateContext) -> Result<AuthConfig> {
    Ok(match def {
        AuthDefinition::None => AuthConfig::None,
        AuthDefinition::Bearer { token } => AuthConfig::Bearer {
            token: render(token, ctx)?,
        },
        AuthDefinition::Basic { username, password } => AuthConfig::Basic {
            username: render(username, ctx)?,
            password: render(password, ctx)?,
        },
        AuthDefinition::ApiKey {
            key,
            value,
            location,
        } => AuthConfig::ApiKey {
            location: *location,
            name: key.clone(),
            value: render(value, ctx)?,
        },
        AuthDefinition::Session {
            login_url,
            method,
            body,
            token_path,
            expires_in_path,
        } => AuthConfig::Session(SessionLogin {
            url: render(login_url, ctx)?,
            method: (*method).into(),
            body: render_value(body, ctx)?,
            token_path: token_path.clone(),
            expires_in_path: expires_in_path.clone(),
        }),
    })
}

/// Set `value` at a dotted path, creating objects along the way
///
/// A non-object value on the way is an error rather than being replaced.
pub fn insert_at_path(target: &mut JsonValue, path: &str, value: JsonValue) -> Result<()> {
    let mut parts = path.split('.').peekable();
    let mut current = target;

    while let Some(part) = parts.next() {
        if part.is_empty() {
            return Err(Error::invalid_value("request.ids_path", format!("empty segment in '{path}'")));
        }
        let JsonValue::Object(map) = current else {
            return Err(Error::invalid_value(
                "request.ids_path",
                format!("'{part}' is not inside an object"),
            ));
        };
        if parts.peek().is_none() {
            map.insert(part.to_string(), value);
            return Ok(());
        }
        current = map
            .entry(part.to_string())
            .or_insert_with(|| JsonValue::Object(serde_json::Map::new()));
    }

    Ok(())
}
