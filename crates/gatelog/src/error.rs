//! Error types for gatelog.
//!
//! This module defines all error types used throughout the gatelog crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for gatelog operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Access Errors ===
    /// No operator identity was supplied.
    #[error("not authenticated: no operator identity provided (use --operator)")]
    NotAuthenticated,

    /// The supplied operator name is not in the configured operators map.
    #[error("not authenticated: unknown operator '{username}'")]
    UnknownOperator {
        /// The operator name that failed to resolve.
        username: String,
    },

    /// The operator is authenticated but does not hold the required role.
    #[error("access denied: '{required}' role required, operator '{username}' has role '{role}'")]
    AccessDenied {
        /// The role the command requires.
        required: String,
        /// The authenticated operator name.
        username: String,
        /// The role the operator actually holds.
        role: String,
    },

    // === Upload Errors ===
    /// The uploaded CSV lacks one or more required columns.
    #[error("missing required columns: {}", .missing.join(", "))]
    MissingColumns {
        /// The required column names that were absent.
        missing: Vec<String>,
    },

    /// Reading the CSV input failed.
    #[error("CSV read failed: {0}")]
    CsvRead(#[from] csv::Error),

    /// A timestamp cell could not be parsed.
    #[error("line {line}: invalid timestamp '{value}'")]
    InvalidTimestamp {
        /// The cell content that failed to parse.
        value: String,
        /// One-based CSV line number (header is line 1).
        line: u64,
    },

    /// A numeric cell could not be parsed.
    #[error("line {line}: column '{column}' has invalid number '{value}'")]
    InvalidNumber {
        /// The column the cell belongs to.
        column: String,
        /// The cell content that failed to parse.
        value: String,
        /// One-based CSV line number (header is line 1).
        line: u64,
    },

    // === Scanner Errors ===
    /// A detection source failed to start.
    #[error("failed to start detection source '{name}': {message}")]
    SourceStart {
        /// Name of the detection source.
        name: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for gatelog operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create an access denied error.
    #[must_use]
    pub fn access_denied(
        required: impl Into<String>,
        username: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self::AccessDenied {
            required: required.into(),
            username: username.into(),
            role: role.into(),
        }
    }

    /// Create a detection source start error.
    #[must_use]
    pub fn source_start(name: &'static str, message: impl Into<String>) -> Self {
        Self::SourceStart {
            name,
            message: message.into(),
        }
    }

    /// Check if this error is an authentication or authorization failure.
    #[must_use]
    pub fn is_access_error(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated | Self::UnknownOperator { .. } | Self::AccessDenied { .. }
        )
    }

    /// Check if this error is an upload validation failure.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::MissingColumns { .. }
                | Self::InvalidTimestamp { .. }
                | Self::InvalidNumber { .. }
        )
    }
}
