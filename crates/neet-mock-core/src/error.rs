//! Core error types for neet-mock-core.
//!
//! Every fallible boundary of the library has its own `thiserror` enum;
//! [`CoreError`] wraps them for callers that just want one type.

use std::path::PathBuf;
use thiserror::Error;

use crate::session::View;

/// Core error type for neet-mock-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Question source errors
    #[error("Question source error: {0}")]
    Source(#[from] SourceError),

    /// Session state machine errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
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

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// The data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
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

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Failures of an external question source.
///
/// During paper provisioning these never abort the paper: the affected
/// subject is recorded as failed and the others proceed.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Transport-level failure talking to the generation service
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The generation service answered with a non-success status
    #[error("Generation service returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// No API key in the configured environment variable
    #[error("API key not set (expected in ${0})")]
    MissingApiKey(String),

    /// The reply could not be turned into any valid question
    #[error("Malformed question data: {0}")]
    Malformed(String),

    /// The question bank has no section for this subject
    #[error("No questions available for subject '{0}'")]
    UnknownSubject(String),

    /// Reading a question bank failed
    #[error("Failed to read question bank {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A question bank is not valid JSON
    #[error("Invalid question bank JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by session operations. State is never mutated when one
/// of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Answer targets a subject/index/label outside the paper's shape
    #[error("Invalid answer target {subject}[{index}] = '{label}': {reason}")]
    InvalidAnswerTarget {
        subject: String,
        index: usize,
        label: String,
        reason: String,
    },

    /// Navigation that the view state machine does not allow
    #[error("Cannot navigate from {from} to {to}")]
    InvalidTransition { from: View, to: View },

    /// The attempt was already submitted
    #[error("Attempt already submitted; reset the session to start again")]
    AttemptClosed,

    /// Practice operation without an open practice set
    #[error("No practice set in progress")]
    NoPracticeSet,

    /// Entering the exam before a paper exists
    #[error("No question paper has been provisioned")]
    PaperNotProvisioned,
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Empty collection or text
    #[error("Empty value: {0}")]
    Empty(String),

    /// Option count outside the allowed range
    #[error("Question must have between {min} and {max} options, got {len}")]
    OptionCount { min: usize, max: usize, len: usize },

    /// Correct label is not one of the options
    #[error("Correct label '{label}' is not one of the options {options:?}")]
    UnknownCorrectLabel { label: String, options: Vec<String> },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseLocked {
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
