//! Error types for docsheet
//!
//! Every fallible operation in the crate returns [`Result`]. Variants are
//! grouped by the stage that produces them so callers can tell a bad
//! definition from an unreachable service.

use thiserror::Error;

/// The main error type for docsheet
#[derive(Error, Debug)]
pub enum Error {
    // ------------------------------------------------------------------
    // Definitions and configuration
    // ------------------------------------------------------------------
    /// Definition or run configuration is unusable
    #[error("Configuration error: {message}")]
    Config {
        /// What is wrong
        message: String,
    },

    /// A required definition field is absent
    #[error("Missing required config field: {field}")]
    MissingConfigField {
        /// Field path
        field: String,
    },

    /// A definition field holds a value it cannot take
    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue {
        /// Field path
        field: String,
        /// What is wrong with the value
        message: String,
    },

    /// Definition YAML does not parse
    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON input or configuration does not parse
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A template names variables the context does not define
    #[error("Undefined variable in template: {variable}")]
    UndefinedVariable {
        /// Comma-separated variable paths
        variable: String,
    },

    // ------------------------------------------------------------------
    // Document store
    // ------------------------------------------------------------------
    /// MongoDB driver failure
    #[error("Document store error: {0}")]
    Source(#[from] mongodb::error::Error),

    /// Filter cannot be converted to a BSON document
    #[error("Filter is not representable as BSON: {0}")]
    Bson(#[from] mongodb::bson::ser::Error),

    /// One query group could not be fetched
    #[error("Query group '{group}' failed: {message}")]
    Query {
        /// Group name
        group: String,
        /// Cause
        message: String,
    },

    // ------------------------------------------------------------------
    // Tabularization
    // ------------------------------------------------------------------
    /// A batch element is not a mapping
    #[error("Record {index} is not a mapping (found {found})")]
    InvalidRecord {
        /// Position in the batch
        index: usize,
        /// JSON type found instead
        found: String,
    },

    /// A response body could not be decoded into records
    #[error("Failed to decode response: {message}")]
    Decode {
        /// Cause
        message: String,
    },

    /// Invalid JSONPath expression
    #[error("JSONPath error: {message}")]
    JsonPath {
        /// Cause, including the offending path
        message: String,
    },

    // ------------------------------------------------------------------
    // Augmentation service
    // ------------------------------------------------------------------
    /// Credential exchange failed or returned no token
    #[error("Authentication failed: {message}")]
    Auth {
        /// Cause
        message: String,
    },

    /// Transport-level request failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status other than 429
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// Status code
        status: u16,
        /// Response body
        body: String,
    },

    /// 429 from the service
    #[error("Rate limited, retry after {retry_after_seconds}s")]
    RateLimited {
        /// Wait requested by the service
        retry_after_seconds: u64,
    },

    /// Request exceeded the client timeout
    #[error("Request timeout after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout
        timeout_ms: u64,
    },

    /// Augmentation fetch failed at any step
    #[error("Augmentation fetch failed: {message}")]
    Augmentation {
        /// Cause
        message: String,
    },

    // ------------------------------------------------------------------
    // Output and files
    // ------------------------------------------------------------------
    /// A table cannot be written to the sink
    #[error("Output error: {message}")]
    Output {
        /// Cause
        message: String,
    },

    /// rust_xlsxwriter failure
    #[error("Workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// Filesystem failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input file does not exist
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path as given
        path: String,
    },

    /// Anything else
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an undefined variable error
    pub fn undefined_var(variable: impl Into<String>) -> Self {
        Self::UndefinedVariable {
            variable: variable.into(),
        }
    }

    /// Create a query group error
    pub fn query(group: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            group: group.into(),
            message: message.into(),
        }
    }

    /// Create an invalid record error
    pub fn invalid_record(index: usize, found: impl Into<String>) -> Self {
        Self::InvalidRecord {
            index,
            found: found.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a JSONPath error
    pub fn json_path(message: impl Into<String>) -> Self {
        Self::JsonPath {
            message: message.into(),
        }
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create an augmentation error
    pub fn augmentation(message: impl Into<String>) -> Self {
        Self::Augmentation {
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Whether a retry might succeed
    ///
    /// Transport failures, timeouts, 429 and gateway-class 5xx statuses
    /// are transient; everything else is final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimited { .. } | Self::Timeout { .. } => true,
            Self::HttpStatus { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }
}

/// Result type alias for docsheet
pub type Result<T> = std::result::Result<T, Error>;

/// Prefix an error with what was being attempted
pub trait ResultExt<T> {
    /// Prefix with a fixed message
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Prefix with a message built only on failure
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.with_context(|| message.into())
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| Error::Other(format!("{}: {}", f(), e.into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::config("test message").to_string(),
            "Configuration error: test message"
        );
        assert_eq!(
            Error::missing_field("connection_string").to_string(),
            "Missing required config field: connection_string"
        );
        assert_eq!(Error::http_status(404, "Not found").to_string(), "HTTP 404: Not found");
        assert_eq!(
            Error::invalid_record(3, "array").to_string(),
            "Record 3 is not a mapping (found array)"
        );
        assert_eq!(
            Error::query("Forms", "boom").to_string(),
            "Query group 'Forms' failed: boom"
        );
        assert_eq!(
            Error::file_not_found("in.json").to_string(),
            "File not found: in.json"
        );
    }

    #[test_case(Error::RateLimited { retry_after_seconds: 60 }, true ; "rate limited")]
    #[test_case(Error::Timeout { timeout_ms: 1000 }, true ; "timeout")]
    #[test_case(Error::http_status(429, ""), true ; "429")]
    #[test_case(Error::http_status(502, ""), true ; "502")]
    #[test_case(Error::http_status(503, ""), true ; "503")]
    #[test_case(Error::http_status(501, ""), false ; "501")]
    #[test_case(Error::http_status(401, ""), false ; "401")]
    #[test_case(Error::http_status(404, ""), false ; "404")]
    #[test_case(Error::config("x"), false ; "config")]
    #[test_case(Error::augmentation("down"), false ; "augmentation")]
    fn test_is_retryable(err: Error, expected: bool) {
        assert_eq!(err.is_retryable(), expected);
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        assert_eq!(
            result.context("outer").unwrap_err().to_string(),
            "outer: Configuration error: inner"
        );

        let io: std::result::Result<(), std::io::Error> = Err(std::io::Error::other("disk"));
        let err = io.with_context(|| "saving out.xlsx".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "saving out.xlsx: IO error: disk");
    }
}
