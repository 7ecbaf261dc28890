//! Core error types for focusroom-core.
//!
//! This module defines the error hierarchy using thiserror. Only two
//! conditions are surfaced by the domain logic itself: invalid timetable
//! input and unavailable notifications. The rest wrap storage, config and
//! serialization failures.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focusroom-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Timetable input was non-numeric, non-positive or below a minimum
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// The platform refused notification delivery. Logged, never fatal.
    #[error("Notifications unavailable: {0}")]
    NotificationUnavailable(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
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

    /// Dot-path key does not exist
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be created
    #[error("Failed to prepare data directory {path}: {message}")]
    DataDir { path: PathBuf, message: String },
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Text that should have been a number
    #[error("'{value}' is not a number for '{field}'")]
    NotANumber { field: String, value: String },

    /// Value must be strictly positive and finite
    #[error("'{field}' must be a positive number, got {value}")]
    NotPositive { field: String, value: f64 },

    /// Value below the minimum accepted by the input form
    #[error("'{field}' must be at least {min}, got {value}")]
    BelowMinimum { field: String, min: f64, value: f64 },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
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
