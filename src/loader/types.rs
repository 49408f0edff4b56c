//! Loader types
//!
//! Declarative export definition types for YAML parsing.

use crate::auth::Location;
use crate::tabular::{ExpansionMode, TabularConfig, DEFAULT_MAX_DEPTH, DEFAULT_SEPARATOR};
use crate::template::config_keys;
use crate::types::{JsonObject, JsonValue, Method};
use serde::{Deserialize, Serialize};

// ============================================================================
// Export Definition
// ============================================================================

/// Top-level export definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExportDefinition {
    /// Export name
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,
    /// Document store connection
    pub source: SourceDefinition,
    /// Run defaults
    #[serde(default)]
    pub run: RunDefinition,
    /// Tabularization settings
    #[serde(default)]
    pub tabular: TabularDefinition,
    /// Query groups, in sheet order
    pub queries: Vec<QueryDefinition>,
    /// Optional augmentation fetch
    #[serde(default)]
    pub augmentation: Option<AugmentationDefinition>,
    /// Output settings
    #[serde(default)]
    pub output: OutputDefinition,
}

impl ExportDefinition {
    /// Look up a query group by name
    pub fn query(&self, name: &str) -> Option<&QueryDefinition> {
        self.queries.iter().find(|q| q.name == name)
    }

    /// User config keys the definition's templates read, sorted
    pub fn config_keys(&self) -> Vec<String> {
        serde_json::to_value(self)
            .map(|value| config_keys(&value))
            .unwrap_or_default()
    }
}

// ============================================================================
// Source Definition
// ============================================================================

/// Document store connection (templated)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SourceDefinition {
    /// Connection string, usually `{{ config.connection_string }}`
    pub connection_string: String,
    /// Database name
    pub database: String,
    /// Application name reported to the server
    #[serde(default)]
    pub app_name: Option<String>,
}

// ============================================================================
// Run Definition
// ============================================================================

/// Defaults for the run-mode toggles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RunDefinition {
    /// Field marking a record as deleted
    #[serde(default = "default_deleted_field")]
    pub deleted_field: String,
    /// Batch identifier used when a single batch is requested
    #[serde(default)]
    pub batch_id: Option<String>,
}

impl Default for RunDefinition {
    fn default() -> Self {
        Self {
            deleted_field: default_deleted_field(),
            batch_id: None,
        }
    }
}

fn default_deleted_field() -> String {
    "isDeleted".to_string()
}

// ============================================================================
// Tabular Definition
// ============================================================================

/// Expansion mode as written in YAML
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionModeDefinition {
    /// Expand array columns once
    SinglePass,
    /// Expand until no arrays remain
    #[default]
    FixedPoint,
}

/// Tabularization settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TabularDefinition {
    /// Path separator
    #[serde(default = "default_separator")]
    pub separator: String,
    /// Expansion mode
    #[serde(default)]
    pub mode: ExpansionModeDefinition,
    /// Pass bound for fixed-point expansion
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for TabularDefinition {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            mode: ExpansionModeDefinition::default(),
            max_depth: default_max_depth(),
        }
    }
}

impl TabularDefinition {
    /// Runtime tabularizer configuration
    pub fn to_config(&self) -> TabularConfig {
        let mode = match self.mode {
            ExpansionModeDefinition::SinglePass => ExpansionMode::SinglePass,
            ExpansionModeDefinition::FixedPoint => ExpansionMode::FixedPoint {
                max_depth: self.max_depth,
            },
        };
        TabularConfig {
            separator: self.separator.clone(),
            mode,
        }
    }
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

// ============================================================================
// Query Definition
// ============================================================================

/// One query group: a collection, a filter and a projection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct QueryDefinition {
    /// Group name, used as the sheet name
    pub name: String,
    /// Collection to query
    pub collection: String,
    /// Base filter, passed through to the store
    #[serde(default)]
    pub filter: JsonObject,
    /// Field allow-list; empty means every field
    #[serde(default)]
    pub projection: Vec<String>,
    /// Field receiving the batch filter
    #[serde(default)]
    pub batch_field: Option<String>,
    /// Whether the deleted-field filter applies
    #[serde(default = "default_true")]
    pub liveness: bool,
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Augmentation Definition
// ============================================================================

/// Secondary fetch correlated with one query group
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AugmentationDefinition {
    /// Sheet name for the fetched records
    pub sheet: String,
    /// Where correlation keys come from
    pub correlation: CorrelationDefinition,
    /// Authentication for the fetch
    #[serde(default)]
    pub auth: AuthDefinition,
    /// The fetch request
    pub request: AugmentationRequestDefinition,
    /// Path to the records in the response
    #[serde(default)]
    pub records_path: Option<String>,
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpDefinition,
}

/// Source of correlation keys
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CorrelationDefinition {
    /// Query group whose table supplies the keys
    pub query: String,
    /// Column holding the keys
    pub column: String,
}

/// Augmentation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AugmentationRequestDefinition {
    /// Endpoint URL (template)
    pub url: String,
    /// HTTP method
    #[serde(default)]
    pub method: Method,
    /// Request body (string leaves are templates)
    #[serde(default = "empty_object")]
    pub body: JsonValue,
    /// Dotted path in the body that receives the key array
    pub ids_path: String,
}

fn empty_object() -> JsonValue {
    JsonValue::Object(JsonObject::new())
}

// ============================================================================
// Credentials for the augmentation fetch
// ============================================================================

/// How the augmentation service is authenticated, tagged by `type`
///
/// String leaves are templates rendered at run time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthDefinition {
    /// Anonymous requests
    #[default]
    None,
    /// Fixed key sent as a header or query parameter
    ApiKey {
        /// Header or parameter name
        key: String,
        /// Key value
        value: String,
        /// `header` (default) or `query`
        #[serde(default)]
        location: Location,
    },
    /// Fixed bearer token
    Bearer {
        /// Token
        token: String,
    },
    /// HTTP Basic credentials
    Basic {
        /// User name
        username: String,
        /// Password
        password: String,
    },
    /// Bearer token obtained by posting to a login endpoint
    Session {
        /// Login endpoint
        login_url: String,
        /// Login method, POST unless set
        #[serde(default)]
        method: Method,
        /// Login body
        #[serde(default = "empty_object")]
        body: JsonValue,
        /// Dotted path to the token in the login response
        token_path: String,
        /// Dotted path to the token lifetime, in seconds
        #[serde(default)]
        expires_in_path: Option<String>,
    },
}

/// Retry, timeout and throttling for the augmentation fetch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HttpDefinition {
    /// Per-attempt timeout, seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Requests per second; unthrottled when absent
    #[serde(default)]
    pub rate_limit_rps: Option<u32>,
}

impl Default for HttpDefinition {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            rate_limit_rps: None,
        }
    }
}

/// The storage service can take minutes on large identifier sets
fn default_timeout_secs() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    3
}

// ============================================================================
// Output Definition
// ============================================================================

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OutputDefinition {
    /// Output file (template)
    #[serde(default = "default_output_file")]
    pub file: String,
}

impl Default for OutputDefinition {
    fn default() -> Self {
        Self {
            file: default_output_file(),
        }
    }
}

fn default_output_file() -> String {
    "EXTRACT_{{ vars.timestamp }}.xlsx".to_string()
}
