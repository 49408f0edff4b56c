//! Runtime credentials
//!
//! Built from an augmentation definition once its templates are rendered.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tokens this close to expiry are treated as expired
pub const EXPIRY_MARGIN_SECS: i64 = 30;

/// Where an API key is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// Request header
    #[default]
    Header,
    /// Query parameter
    Query,
}

/// Login request that yields a bearer token
#[derive(Debug, Clone)]
pub struct SessionLogin {
    /// Login endpoint
    pub url: String,
    /// Login method
    pub method: reqwest::Method,
    /// JSON body, sent as-is
    pub body: Value,
    /// Dotted path to the token in the response
    pub token_path: String,
    /// Dotted path to the token lifetime in seconds
    pub expires_in_path: Option<String>,
}

/// Credentials attached to outgoing requests
#[derive(Debug, Clone, Default)]
pub enum AuthConfig {
    /// Anonymous
    #[default]
    None,
    /// Static key in a header or query parameter
    ApiKey {
        /// Placement
        location: Location,
        /// Header or parameter name
        name: String,
        /// Key value
        value: String,
    },
    /// HTTP Basic
    Basic {
        /// User name
        username: String,
        /// Password
        password: String,
    },
    /// Static bearer token
    Bearer {
        /// Token
        token: String,
    },
    /// Bearer token obtained from a login endpoint
    Session(SessionLogin),
}

impl AuthConfig {
    /// Whether requests go out anonymously
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Session token and its expiry, if the login reported one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedToken {
    /// Bearer token
    pub token: String,
    /// Expiry instant
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Token without a known lifetime
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
        }
    }

    /// Token valid for `seconds` from now
    pub fn expires_in(token: impl Into<String>, seconds: i64) -> Self {
        Self {
            token: token.into(),
            expires_at: Some(Utc::now() + Duration::seconds(seconds)),
        }
    }

    /// Whether the token must be replaced before use
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|at| Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS) >= at)
    }
}
