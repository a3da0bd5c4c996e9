//! Structured error output for CI consumers.
//!
//! Provides machine-parseable error information with:
//! - Error codes for categorization
//! - Hints for self-correction
//! - Context for debugging (paths, fixture names, diff entries)

use crate::error::ConformanceError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Machine-readable error codes.
///
/// These codes are stable and can be used for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // === Mismatch (exit code 2) ===
    /// Actual report differs from golden
    ReportMismatch,
    /// Fixture-specific invariant failed
    InvariantViolated,

    // === Fixture / golden (exit code 3) ===
    /// Golden file missing
    GoldenMissing,
    /// Subject did not write a report
    ReportMissing,
    /// Fixture root directory missing
    FixtureRootMissing,
    /// Selected fixture does not exist
    FixtureNotFound,
    /// Malformed fixture.yaml
    ManifestError,

    // === Subject process (exit code 4) ===
    /// Process could not be spawned
    SpawnFailed,
    /// Process exited with an untolerated status
    SubjectFailed,

    // === Config (exit code 5) ===
    /// Configuration error
    ConfigError,
    /// Oracle command missing
    OracleNotConfigured,

    // === I/O (exit code 6) ===
    /// File I/O error
    IoError,
    /// JSON report parse error
    JsonParseError,
    /// ndjson report parse error
    NdjsonParseError,
    /// JSON serialization error
    JsonError,
    /// YAML parsing error
    YamlError,

    // === Internal (exit code 1) ===
    /// Unexpected internal error
    InternalError,
}

impl ErrorCode {
    /// Classify an error.
    #[must_use]
    pub const fn of(err: &ConformanceError) -> Self {
        match err {
            ConformanceError::ReportMismatch { .. } => Self::ReportMismatch,
            ConformanceError::InvariantViolated { .. } => Self::InvariantViolated,
            ConformanceError::GoldenMissing { .. } => Self::GoldenMissing,
            ConformanceError::ReportMissing { .. } => Self::ReportMissing,
            ConformanceError::FixtureRootMissing { .. } => Self::FixtureRootMissing,
            ConformanceError::FixtureNotFound { .. } => Self::FixtureNotFound,
            ConformanceError::Manifest { .. } => Self::ManifestError,
            ConformanceError::SpawnFailed { .. } => Self::SpawnFailed,
            ConformanceError::SubjectFailed { .. } => Self::SubjectFailed,
            ConformanceError::Config(_) => Self::ConfigError,
            ConformanceError::OracleNotConfigured => Self::OracleNotConfigured,
            ConformanceError::Io(_) => Self::IoError,
            ConformanceError::JsonParse { .. } => Self::JsonParseError,
            ConformanceError::NdjsonParse { .. } => Self::NdjsonParseError,
            ConformanceError::Json(_) => Self::JsonError,
            ConformanceError::Yaml(_) => Self::YamlError,
            ConformanceError::Other(_) => Self::InternalError,
        }
    }

    /// Get the string representation for JSON output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ReportMismatch => "REPORT_MISMATCH",
            Self::InvariantViolated => "INVARIANT_VIOLATED",
            Self::GoldenMissing => "GOLDEN_MISSING",
            Self::ReportMissing => "REPORT_MISSING",
            Self::FixtureRootMissing => "FIXTURE_ROOT_MISSING",
            Self::FixtureNotFound => "FIXTURE_NOT_FOUND",
            Self::ManifestError => "MANIFEST_ERROR",
            Self::SpawnFailed => "SPAWN_FAILED",
            Self::SubjectFailed => "SUBJECT_FAILED",
            Self::ConfigError => "CONFIG_ERROR",
            Self::OracleNotConfigured => "ORACLE_NOT_CONFIGURED",
            Self::IoError => "IO_ERROR",
            Self::JsonParseError => "JSON_PARSE_ERROR",
            Self::NdjsonParseError => "NDJSON_PARSE_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::YamlError => "YAML_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Get the exit code for this error category.
    ///
    /// - 1: Internal/unknown errors
    /// - 2: Report mismatch
    /// - 3: Fixture / golden file errors
    /// - 4: Subject process errors
    /// - 5: Config errors
    /// - 6: I/O and parse errors
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ReportMismatch | Self::InvariantViolated => 2,
            Self::GoldenMissing
            | Self::ReportMissing
            | Self::FixtureRootMissing
            | Self::FixtureNotFound
            | Self::ManifestError => 3,
            Self::SpawnFailed | Self::SubjectFailed => 4,
            Self::ConfigError | Self::OracleNotConfigured => 5,
            Self::IoError
            | Self::JsonParseError
            | Self::NdjsonParseError
            | Self::JsonError
            | Self::YamlError => 6,
            Self::InternalError => 1,
        }
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
    /// Additional context data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl StructuredError {
    /// Create a new structured error from a `ConformanceError`.
    #[must_use]
    pub fn from_error(err: &ConformanceError) -> Self {
        Self {
            code: ErrorCode::of(err),
            message: err.to_string(),
            hint: err.suggestion().map(str::to_string),
            context: Self::extract_context(err),
        }
    }

    /// Convert to JSON value for output.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "code": self.code.as_str(),
                "message": self.message,
                "hint": self.hint,
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

    fn extract_context(err: &ConformanceError) -> Option<Value> {
        match err {
            ConformanceError::GoldenMissing { path }
            | ConformanceError::ReportMissing { path }
            | ConformanceError::FixtureRootMissing { path } => {
                Some(json!({"path": path.display().to_string()}))
            }
            ConformanceError::JsonParse { path, .. } => {
                Some(json!({"path": path.display().to_string()}))
            }
            ConformanceError::NdjsonParse { path, line, .. } => Some(json!({
                "path": path.display().to_string(),
                "line": line,
            })),
            ConformanceError::FixtureNotFound { name, root } => Some(json!({
                "fixture": name,
                "root": root.display().to_string(),
            })),
            ConformanceError::Manifest { path, .. } => {
                Some(json!({"path": path.display().to_string()}))
            }
            ConformanceError::SpawnFailed { command, .. } => Some(json!({"command": command})),
            ConformanceError::SubjectFailed { fixture, exit, .. } => {
                Some(json!({"fixture": fixture, "exit": exit}))
            }
            ConformanceError::ReportMismatch {
                fixture,
                report,
                diff,
            } => Some(json!({
                "fixture": fixture,
                "report": report,
                "diff_count": diff.len(),
                "diffs": diff.entries(),
            })),
            ConformanceError::InvariantViolated {
                fixture, report, ..
            } => Some(json!({"fixture": fixture, "report": report})),
            _ => None,
        }
    }
}
