//! Error types and handling for `lunch_and_learn`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Supports `anyhow` integration for ad-hoc failures
//! - Provides recovery hints for user-facing errors
//! - Every error maps to exit code 1

mod structured;

pub use structured::{ErrorCode, StructuredError};

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for `lal` operations.
#[derive(Error, Debug)]
pub enum LalError {
    // === Client Errors ===
    /// The issue service could not be reached (refused, DNS, timeout).
    #[error("Could not connect to {url}: {reason}")]
    Connectivity { url: String, reason: String },

    /// The issue service answered with a non-success status or a malformed body.
    #[error("API request to {url} failed{}: {reason}", .status.map_or_else(String::new, |s| format!(" (HTTP {s})")))]
    Request {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    /// The configured base URL cannot be parsed.
    #[error("Invalid service URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    // === Schema Errors ===
    /// The `Issues` table does not exist in the database.
    #[error("Table '{table}' does not exist in {path}")]
    TableMissing { table: String, path: PathBuf },

    /// Neither the legacy urgency flag nor the priority column is present.
    #[error(
        "Schema error: table '{table}' has neither '{legacy}' nor '{target}'; cannot infer priority (columns: {observed:?})"
    )]
    NoUrgencyColumns {
        table: String,
        legacy: String,
        target: String,
        observed: Vec<String>,
    },

    /// Backfill left rows without a valid priority.
    #[error("Schema error: {count} row(s) have no valid priority after backfill; migration rolled back")]
    UnsetPriority { count: usize },

    /// The table is not in the shape an operation requires.
    #[error("Schema error: expected {expected}, found {found}")]
    SchemaMismatch { expected: String, found: String },

    // === Storage Errors ===
    /// Database file not found at the specified path.
    #[error("Database not found at '{path}'")]
    DatabaseNotFound { path: PathBuf },

    /// `SQLite` database error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// No backup exists to roll back to.
    #[error("No backup found for '{path}' in {history_dir}")]
    BackupNotFound { path: PathBuf, history_dir: PathBuf },

    // === Input Errors ===
    /// Invalid priority value.
    #[error("Invalid priority: {priority}")]
    InvalidPriority { priority: String },

    /// Failed to parse a row of the CSV snapshot.
    #[error("CSV parse error at line {line}: {reason}")]
    Csv { line: usize, reason: String },

    // === Configuration Errors ===
    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Error with additional context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Wrapped anyhow error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LalError {
    /// Is this one of the schema-shape failures?
    #[must_use]
    pub const fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Self::TableMissing { .. }
                | Self::NoUrgencyColumns { .. }
                | Self::UnsetPriority { .. }
                | Self::SchemaMismatch { .. }
        )
    }

    /// Can the user fix this without code changes?
    #[must_use]
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Connectivity { .. }
                | Self::InvalidUrl { .. }
                | Self::DatabaseNotFound { .. }
                | Self::InvalidPriority { .. }
                | Self::TableMissing { .. }
                | Self::Config(_)
        )
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Connectivity { .. } => Some("Make sure the issue service is running"),
            Self::InvalidUrl { .. } => Some("Pass a full URL, e.g. --url http://localhost:5099"),
            Self::DatabaseNotFound { .. } => Some("Check the path or run: lal init <DB>"),
            Self::TableMissing { .. } => Some("Run: lal init <DB>"),
            Self::UnsetPriority { .. } => {
                Some("Fix IsUrgent values that are not 0 or 1, then re-run the migration")
            }
            Self::SchemaMismatch { .. } => Some("Run: lal migrate <DB>"),
            Self::BackupNotFound { .. } => Some("Backups are only taken when --no-backup is not set"),
            Self::InvalidPriority { .. } => Some("Valid priorities: LOW, MEDIUM, HIGH"),
            _ => None,
        }
    }

    /// Get the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        1
    }

    /// Wrap any error with a context message.
    #[must_use]
    pub fn with_context(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

/// Result type using `LalError`.
pub type Result<T> = std::result::Result<T, LalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LalError::UnsetPriority { count: 3 };
        assert_eq!(
            err.to_string(),
            "Schema error: 3 row(s) have no valid priority after backfill; migration rolled back"
        );
    }

    #[test]
    fn test_request_error_display_with_and_without_status() {
        let err = LalError::Request {
            url: "http://x/issues".to_string(),
            status: Some(500),
            reason: "Internal Server Error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API request to http://x/issues failed (HTTP 500): Internal Server Error"
        );

        let err = LalError::Request {
            url: "http://x/issues".to_string(),
            status: None,
            reason: "bad body".to_string(),
        };
        assert_eq!(err.to_string(), "API request to http://x/issues failed: bad body");
    }

    #[test]
    fn test_schema_classification() {
        assert!(LalError::UnsetPriority { count: 1 }.is_schema_error());
        assert!(
            LalError::TableMissing {
                table: "Issues".into(),
                path: PathBuf::from("x.db"),
            }
            .is_schema_error()
        );
        assert!(!LalError::Config("x".into()).is_schema_error());
    }

    #[test]
    fn test_suggestion() {
        let err = LalError::Connectivity {
            url: "http://localhost:5099".to_string(),
            reason: "refused".to_string(),
        };
        assert_eq!(err.suggestion(), Some("Make sure the issue service is running"));
        assert!(err.is_user_recoverable());
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_database_error_not_recoverable() {
        let err = LalError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(1),
            None,
        ));
        assert!(!err.is_user_recoverable());
    }
}
