//! Structured error output.
//!
//! Provides machine-parseable error information with:
//! - Error codes for categorization
//! - Hints for self-correction
//! - Retryability flags
//! - Context for debugging (target, expected vs. observed state)

use crate::error::LalError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Machine-readable error codes.
///
/// Format: `SCREAMING_SNAKE_CASE` for easy parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // === Client ===
    /// Issue service unreachable
    ConnectivityError,
    /// Non-success or malformed response
    RequestError,
    /// Base URL is not a URL
    InvalidUrl,

    // === Schema ===
    /// Table, column set, or data not in the expected shape
    SchemaError,

    // === Storage ===
    /// Database file not found
    DatabaseNotFound,
    /// Database operation failed
    DatabaseError,
    /// No backup available for rollback
    BackupNotFound,

    // === Input ===
    /// Priority not one of LOW/MEDIUM/HIGH
    InvalidPriority,
    /// Bad CSV snapshot
    CsvParseError,
    /// Configuration error
    ConfigError,

    // === I/O ===
    /// File I/O error
    IoError,
    /// JSON serialization error
    JsonError,
    /// YAML parsing error
    YamlError,

    // === Internal ===
    /// Unexpected internal error
    InternalError,
}

impl ErrorCode {
    /// Get the string representation for JSON output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectivityError => "CONNECTIVITY_ERROR",
            Self::RequestError => "REQUEST_ERROR",
            Self::InvalidUrl => "INVALID_URL",
            Self::SchemaError => "SCHEMA_ERROR",
            Self::DatabaseNotFound => "DATABASE_NOT_FOUND",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::BackupNotFound => "BACKUP_NOT_FOUND",
            Self::InvalidPriority => "INVALID_PRIORITY",
            Self::CsvParseError => "CSV_PARSE_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::YamlError => "YAML_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether re-running the same command later might succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectivityError | Self::RequestError)
    }

    /// Get the process exit code for this error category.
    ///
    /// Every failure exits with 1.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        1
    }
}

/// Structured error for machine-parseable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional hint for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether the operation can be retried
    pub retryable: bool,
    /// Additional context data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl StructuredError {
    /// Create a new structured error from a `LalError`.
    #[must_use]
    pub fn from_error(err: &LalError) -> Self {
        let (code, context) = Self::extract_code_and_context(err);
        let hint = err.suggestion().map(ToString::to_string);

        Self {
            code,
            message: err.to_string(),
            hint,
            retryable: code.is_retryable(),
            context,
        }
    }

    /// Format as JSON for stderr.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "code": self.code.as_str(),
                "message": self.message,
                "hint": self.hint,
                "retryable": self.retryable,
                "context": self.context,
            }
        })
    }

    /// Format for human-readable output.
    #[must_use]
    pub fn to_human(&self, color: bool) -> String {
        let mut output = String::new();

        if color {
            output.push_str("\x1b[31mError:\x1b[0m ");
        } else {
            output.push_str("Error: ");
        }

        output.push_str(&self.message);

        if let Some(hint) = &self.hint {
            output.push('\n');
            if color {
                output.push_str("\x1b[33mHint:\x1b[0m ");
            } else {
                output.push_str("Hint: ");
            }
            output.push_str(hint);
        }

        output
    }

    fn extract_code_and_context(err: &LalError) -> (ErrorCode, Option<Value>) {
        match err {
            LalError::Connectivity { url, .. } => {
                (ErrorCode::ConnectivityError, Some(json!({"url": url})))
            }
            LalError::Request { url, status, .. } => (
                ErrorCode::RequestError,
                Some(json!({"url": url, "status": status})),
            ),
            LalError::InvalidUrl { url, .. } => (ErrorCode::InvalidUrl, Some(json!({"url": url}))),
            LalError::TableMissing { table, path } => (
                ErrorCode::SchemaError,
                Some(json!({
                    "table": table,
                    "path": path.display().to_string(),
                    "expected": "table present",
                    "observed": "table missing",
                })),
            ),
            LalError::NoUrgencyColumns {
                table,
                legacy,
                target,
                observed,
            } => (
                ErrorCode::SchemaError,
                Some(json!({
                    "table": table,
                    "expected": [legacy, target],
                    "observed": observed,
                })),
            ),
            LalError::UnsetPriority { count } => (
                ErrorCode::SchemaError,
                Some(json!({"unset_rows": count})),
            ),
            LalError::SchemaMismatch { expected, found } => (
                ErrorCode::SchemaError,
                Some(json!({"expected": expected, "observed": found})),
            ),
            LalError::DatabaseNotFound { path } => (
                ErrorCode::DatabaseNotFound,
                Some(json!({"path": path.display().to_string()})),
            ),
            LalError::Database(_) => (ErrorCode::DatabaseError, None),
            LalError::BackupNotFound { path, history_dir } => (
                ErrorCode::BackupNotFound,
                Some(json!({
                    "path": path.display().to_string(),
                    "history_dir": history_dir.display().to_string(),
                })),
            ),
            LalError::InvalidPriority { priority } => (
                ErrorCode::InvalidPriority,
                Some(json!({"provided": priority, "valid": ["LOW", "MEDIUM", "HIGH"]})),
            ),
            LalError::Csv { line, reason } => (
                ErrorCode::CsvParseError,
                Some(json!({"line": line, "reason": reason})),
            ),
            LalError::Config(_) => (ErrorCode::ConfigError, None),
            LalError::Io(_) => (ErrorCode::IoError, None),
            LalError::Json(_) => (ErrorCode::JsonError, None),
            LalError::Yaml(_) => (ErrorCode::YamlError, None),
            LalError::WithContext { .. } | LalError::Other(_) => (ErrorCode::InternalError, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_connectivity_is_retryable() {
        let err = LalError::Connectivity {
            url: "http://localhost:5099".to_string(),
            reason: "connection refused".to_string(),
        };
        let structured = StructuredError::from_error(&err);
        assert_eq!(structured.code, ErrorCode::ConnectivityError);
        assert!(structured.retryable);
        assert_eq!(structured.code.exit_code(), 1);
        assert_eq!(
            structured.hint.as_deref(),
            Some("Make sure the issue service is running")
        );
    }

    #[test]
    fn test_schema_error_context_reports_expected_and_observed() {
        let err = LalError::NoUrgencyColumns {
            table: "Issues".to_string(),
            legacy: "IsUrgent".to_string(),
            target: "Priority".to_string(),
            observed: vec!["Code".to_string(), "ShortDescription".to_string()],
        };
        let json = StructuredError::from_error(&err).to_json();
        assert_eq!(json["error"]["code"], "SCHEMA_ERROR");
        assert_eq!(json["error"]["context"]["expected"][0], "IsUrgent");
        assert_eq!(json["error"]["context"]["observed"][1], "ShortDescription");
        assert_eq!(json["error"]["retryable"], false);
    }

    #[test]
    fn test_to_human_plain_includes_hint() {
        let err = LalError::DatabaseNotFound {
            path: PathBuf::from("missing.db"),
        };
        let human = StructuredError::from_error(&err).to_human(false);
        assert!(human.starts_with("Error: Database not found at 'missing.db'"));
        assert!(human.contains("\nHint: Check the path"));
        assert!(!human.contains("\x1b["));
    }
}
