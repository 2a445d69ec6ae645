//! Error types for getlush
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (request construction, fetching, periods)
//! - Classification of every failure into a [`FailureStage`]
//! - Machine-readable error codes for reporting

use crate::types::FailureStage;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for getlush operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for getlush
///
/// Per-item failures (request, fetch, persist) never abort a batch; they end up in
/// the batch report. Only [`Error::Config`] is fatal, and it is raised before any
/// network activity. Malformed periods are rejected earlier still, by the parsers
/// that return [`PeriodError`].
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message, one problem per line
        message: String,
        /// The configuration key that caused the error, when there is a single one
        key: Option<String>,
    },

    /// A request could not be constructed
    #[error("request construction failed: {0}")]
    Request(#[from] RequestError),

    /// A document could not be fetched or was not a document
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// A fetched document could not be written to disk
    #[error("failed to write {}: {source}", .path.display())]
    Persist {
        /// Destination path of the document
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client setup error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors produced while parsing or constructing periods
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodError {
    /// Input string is not in the expected shape
    #[error("'{input}' is not a valid {expected} value")]
    Malformed {
        /// The rejected input
        input: String,
        /// Expected format, e.g. "YYYY-MM"
        expected: &'static str,
    },

    /// Month number outside 1..=12
    #[error("month {month} is out of range (1-12)")]
    MonthOutOfRange {
        /// The rejected month number
        month: u32,
    },

    /// Year not representable as a calendar date
    #[error("year {year} is out of range")]
    YearOutOfRange {
        /// The rejected year
        year: i32,
    },
}

/// Errors produced while building a request for a single period
#[derive(Debug, Error)]
pub enum RequestError {
    /// The assembled URL could not be parsed
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        /// The URL that failed to parse
        url: String,
        /// Parser error
        source: url::ParseError,
    },

    /// The URL parsed but does not use http or https
    #[error("unsupported URL scheme '{scheme}' (expected http or https)")]
    UnsupportedScheme {
        /// The rejected scheme
        scheme: String,
    },

    /// The session cookie contains bytes that are not allowed in a header value
    #[error("session cookie is not a valid HTTP header value")]
    InvalidCookie,
}

/// Errors produced while fetching and validating a document
#[derive(Debug, Error)]
pub enum FetchError {
    /// The exchange did not finish within the configured timeout
    #[error("request to {url} timed out after {}s", .timeout.as_secs_f64())]
    Timeout {
        /// Requested URL
        url: String,
        /// The timeout that was exceeded
        timeout: Duration,
    },

    /// Could not connect to the remote host
    #[error("connection to {url} failed: {reason}")]
    Connect {
        /// Requested URL
        url: String,
        /// Transport error message
        reason: String,
    },

    /// Any other transport failure while sending the request
    #[error("request to {url} failed: {reason}")]
    Transport {
        /// Requested URL
        url: String,
        /// Transport error message
        reason: String,
    },

    /// The response body could not be read in full
    #[error("failed to read response body from {url}: {reason}")]
    Body {
        /// Requested URL
        url: String,
        /// Transport error message
        reason: String,
    },

    /// The body is shorter than the document signature
    #[error("response was not a PDF: body has only {len} bytes")]
    TooShort {
        /// Body length in bytes
        len: usize,
    },

    /// The body does not start with the document signature
    #[error("response was not a PDF ({len} bytes, starts with {prefix:?})")]
    NotADocument {
        /// Body length in bytes
        len: usize,
        /// Lossy rendering of the first bytes, for diagnostics
        prefix: String,
    },
}

impl FetchError {
    /// Whether this failure happened on the wire rather than in content validation
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            FetchError::Timeout { .. }
                | FetchError::Connect { .. }
                | FetchError::Transport { .. }
                | FetchError::Body { .. }
        )
    }

    /// Classify this failure
    pub fn stage(&self) -> FailureStage {
        if self.is_network() {
            FailureStage::Network
        } else {
            FailureStage::ContentValidation
        }
    }
}

impl Error {
    /// Build a configuration error for a single key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Which stage of processing this error belongs to
    pub fn stage(&self) -> FailureStage {
        match self {
            Error::Config { .. } | Error::Serialization(_) => FailureStage::Configuration,
            Error::Request(_) => FailureStage::RequestConstruction,
            Error::Fetch(e) => e.stage(),
            Error::Network(_) => FailureStage::Network,
            Error::Persist { .. } | Error::Io(_) => FailureStage::Persistence,
        }
    }

    /// Get the machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Request(e) => match e {
                RequestError::InvalidUrl { .. } => "invalid_url",
                RequestError::UnsupportedScheme { .. } => "unsupported_scheme",
                RequestError::InvalidCookie => "invalid_cookie",
            },
            Error::Fetch(e) => match e {
                FetchError::Timeout { .. } => "timeout",
                FetchError::Connect { .. } => "connect_failed",
                FetchError::Transport { .. } => "network_error",
                FetchError::Body { .. } => "body_read_failed",
                FetchError::TooShort { .. } => "body_too_short",
                FetchError::NotADocument { .. } => "not_a_document",
            },
            Error::Persist { .. } => "write_failed",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
        }
    }
}
