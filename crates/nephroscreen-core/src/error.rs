//! Core error types for nephroscreen-core.
//!
//! This module defines the error hierarchy used across the library,
//! built on thiserror. Module-local error enums (`WizardError`,
//! `ReportError`) live next to their modules and fold into [`CoreError`]
//! here.

use std::path::PathBuf;
use thiserror::Error;

use crate::report::ReportError;
use crate::wizard::WizardError;

/// Core error type for nephroscreen-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Wizard state-machine errors
    #[error("wizard error: {0}")]
    Wizard(#[from] WizardError),

    /// Report token encode/decode errors
    #[error("report error: {0}")]
    Report(#[from] ReportError),

    /// CRM forwarding errors
    #[error("CRM error: {0}")]
    Crm(#[from] CrmError),

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
    #[error("failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown configuration key
    #[error("unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// No usable data directory
    #[error("no usable data directory: {0}")]
    DataDir(String),
}

/// CRM sink errors.
///
/// These are always recovered locally: a lead that cannot be forwarded is
/// logged and dropped, never allowed to block the assessment result.
#[derive(Error, Debug)]
pub enum CrmError {
    /// No webhook URL stored
    #[error("CRM webhook URL is not configured")]
    NotConfigured,

    /// Webhook URL failed validation
    #[error("invalid CRM webhook URL: {0}")]
    InvalidUrl(String),

    /// Endpoint answered with a non-success status
    #[error("CRM endpoint rejected the lead (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    /// Transport-level failure
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Credential store failure
    #[error("credential store error: {0}")]
    Credentials(String),

    /// Async runtime could not be created
    #[error("runtime error: {0}")]
    Runtime(String),
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

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
