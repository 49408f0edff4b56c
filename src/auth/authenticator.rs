//! Applies credentials to outgoing requests
//!
//! Session tokens are fetched lazily, cached, and replaced once they come
//! within the expiry margin.

use super::types::{AuthConfig, CachedToken, Location, SessionLogin};
use crate::decode::value_at;
use crate::error::{Error, Result};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

/// Attaches credentials to requests
pub struct Authenticator {
    config: AuthConfig,
    client: Client,
    session: RwLock<Option<CachedToken>>,
}

impl Authenticator {
    /// Authenticator with its own connection pool for logins
    pub fn new(config: AuthConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    /// Authenticator that logs in through `client`
    pub fn with_client(config: AuthConfig, client: Client) -> Self {
        Self {
            config,
            client,
            session: RwLock::new(None),
        }
    }

    /// Credentials in use
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Add credentials to `req`, logging in first if needed
    pub async fn apply(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        Ok(match &self.config {
            AuthConfig::None => req,
            AuthConfig::ApiKey {
                location: Location::Header,
                name,
                value,
            } => req.header(name.as_str(), value.as_str()),
            AuthConfig::ApiKey {
                location: Location::Query,
                name,
                value,
            } => req.query(&[(name, value)]),
            AuthConfig::Basic { username, password } => req.basic_auth(username, Some(password)),
            AuthConfig::Bearer { token } => req.bearer_auth(token),
            AuthConfig::Session(login) => req.bearer_auth(self.session_token(login).await?),
        })
    }

    /// Drop the cached session token
    pub async fn clear_cache(&self) {
        *self.session.write().await = None;
    }

    async fn session_token(&self, login: &SessionLogin) -> Result<String> {
        if let Some(token) = self.session.read().await.as_ref().filter(|t| !t.is_expired()) {
            return Ok(token.token.clone());
        }

        let mut slot = self.session.write().await;
        // A concurrent caller may have logged in while we waited
        if let Some(token) = slot.as_ref().filter(|t| !t.is_expired()) {
            return Ok(token.token.clone());
        }

        let fresh = self.login(login).await?;
        let token = fresh.token.clone();
        *slot = Some(fresh);
        Ok(token)
    }

    async fn login(&self, login: &SessionLogin) -> Result<CachedToken> {
        debug!(url = %login.url, "logging in for session token");

        let response = self
            .client
            .request(login.method.clone(), &login.url)
            .json(&login.body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::auth(format!(
                "Login to {} failed with status {}: {body}",
                login.url,
                status.as_u16()
            )));
        }

        let body: Value = response.json().await?;
        let token = scalar_at(&body, &login.token_path).ok_or_else(|| {
            Error::auth(format!("No token at '{}' in login response", login.token_path))
        })?;

        let lifetime = login
            .expires_in_path
            .as_deref()
            .and_then(|path| scalar_at(&body, path))
            .and_then(|secs| secs.parse::<i64>().ok());

        Ok(match lifetime {
            Some(secs) => CachedToken::expires_in(token, secs),
            None => CachedToken::new(token),
        })
    }
}

/// Scalar at a dotted path, rendered as text
pub fn scalar_at(value: &Value, path: &str) -> Option<String> {
    match value_at(value, path)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.config {
            AuthConfig::None => "none",
            AuthConfig::ApiKey { .. } => "api_key",
            AuthConfig::Basic { .. } => "basic",
            AuthConfig::Bearer { .. } => "bearer",
            AuthConfig::Session(_) => "session",
        };
        f.debug_struct("Authenticator").field("kind", &kind).finish_non_exhaustive()
    }
}
