//! Error types for lanepager
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Errors fall into three retry classes:
//! - transient (transport failures, bad lane statuses) are retried by the
//!   retry controller,
//! - contract and configuration errors propagate immediately,
//! - `FatalRound` wraps the last transient error once attempts run out.

use thiserror::Error;

/// The main error type for lanepager
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Connection failed: {message}")]
    Connection { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Round Errors
    // ============================================================================
    #[error("Lane {lane} returned HTTP {status}: {body}")]
    ResponseStatus { lane: usize, status: u16, body: String },

    #[error("Contract violation: {message}")]
    Contract { message: String },

    #[error("Giving up after {attempts} attempts: {source}")]
    FatalRound {
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    #[error("Traversal cancelled")]
    Cancelled,

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
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

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a lane status error
    pub fn response_status(lane: usize, status: u16, body: impl Into<String>) -> Self {
        Self::ResponseStatus {
            lane,
            status,
            body: body.into(),
        }
    }

    /// Create a contract error
    pub fn contract(message: impl Into<String>) -> Self {
        Self::Contract {
            message: message.into(),
        }
    }

    /// Wrap the last transient error of an exhausted retry budget
    pub fn fatal_round(attempts: u32, source: Error) -> Self {
        Self::FatalRound {
            attempts,
            source: Box::new(source),
        }
    }

    /// Check if this error may go away on a later attempt
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Http(_)
                | Error::Connection { .. }
                | Error::Timeout { .. }
                | Error::ResponseStatus { .. }
        )
    }

    /// Check if this error ended a traversal
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::FatalRound { .. })
    }

    /// Numeric code attached to log events
    ///
    /// HTTP status where one is known, otherwise 0.
    pub fn code(&self) -> u16 {
        match self {
            Error::ResponseStatus { status, .. } => *status,
            Error::Http(e) => e.status().map_or(0, |s| s.as_u16()),
            Error::FatalRound { source, .. } => source.code(),
            _ => 0,
        }
    }
}

/// Result type alias for lanepager
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
