//! Core error types for goalpost-core.
//!
//! Each concern owns a thiserror enum; [`CoreError`] rolls them up for the
//! service and API layers.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for goalpost-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Reminder parsing errors
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Integration-related errors
    #[error("Integration error for '{service}': {message}")]
    Integration {
        service: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Requested goal does not exist
    #[error("Goal not found: {0}")]
    NotFound(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Build an integration error without an underlying cause.
    pub fn integration(service: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Integration {
            service: service.into(),
            message: message.into(),
            source: None,
        }
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(err: reqwest::Error) -> Self {
        CoreError::Integration {
            service: "http".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// Failures reported by a task or entity extraction capability.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The extractor produced nothing usable as a task title
    #[error("no task could be extracted from the text")]
    EmptyTask,

    /// The extractor itself failed
    #[error("extractor failed: {0}")]
    Failed(String),

    /// A serialized extractor's lock was poisoned by a panicking caller
    #[error("extractor lock poisoned")]
    Poisoned,
}

/// Errors surfaced by reminder composition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Task extraction failed; composition did not proceed
    #[error("task extraction failed: {0}")]
    TaskExtractionFailed(#[source] ExtractionError),

    /// The composed time window falls outside the representable range
    #[error("reminder time is out of range")]
    TimeOutOfRange,
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Stored row could not be decoded
    #[error("Corrupt row for goal '{goal_id}': {message}")]
    CorruptRow { goal_id: String, message: String },

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Missing required configuration key
    #[error("Missing required configuration key: {0}")]
    MissingKey(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Invalid time range
    #[error("Invalid time range: end_time ({end}) must be greater than start_time ({start})")]
    InvalidTimeRange {
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    },

    /// Field name not recognised for updates
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Chat webhook payloads that carry no usable message.
#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("Invalid webhook JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Webhook payload has no {0}")]
    MissingField(&'static str),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
