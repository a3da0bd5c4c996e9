//! Error types and handling for `report_conformance`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Wraps `anyhow` for ad-hoc failures from the CLI layer
//! - Provides recovery hints for user-facing errors
//! - Maps every variant to a stable exit code category
//! - Provides structured JSON output for CI consumers

mod structured;

pub use structured::{ErrorCode, StructuredError};

use crate::compare::Diff;
use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for harness operations.
#[derive(Error, Debug)]
pub enum ConformanceError {
    // === Golden / report files ===
    /// A golden file is mandatory input; its absence is never a vacuous pass.
    #[error("Golden file not found: '{path}'")]
    GoldenMissing { path: PathBuf },

    /// The subject finished but did not write the expected report.
    #[error("Report not produced: '{path}'")]
    ReportMissing { path: PathBuf },

    /// A JSON report could not be parsed.
    #[error("Invalid JSON in '{path}': {reason}")]
    JsonParse { path: PathBuf, reason: String },

    /// A line of an ndjson report could not be parsed.
    #[error("ndjson parse error in '{path}' at line {line}: {reason}")]
    NdjsonParse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    // === Fixtures ===
    /// The fixture root directory does not exist.
    #[error("Fixture root not found: '{path}'")]
    FixtureRootMissing { path: PathBuf },

    /// A selected fixture has no directory under the root.
    #[error("Fixture '{name}' not found under '{root}'")]
    FixtureNotFound { name: String, root: PathBuf },

    /// A fixture manifest (`fixture.yaml`) is malformed.
    #[error("Invalid fixture manifest '{path}': {reason}")]
    Manifest { path: PathBuf, reason: String },

    // === Subject process ===
    /// The subject (or oracle) process could not be started.
    #[error("Failed to spawn '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The subject exited in a way that is not the tolerated failure shape.
    #[error("Subject failed for fixture '{fixture}' ({exit})\n{stderr_tail}")]
    SubjectFailed {
        fixture: String,
        exit: String,
        stderr_tail: String,
    },

    // === Assertions ===
    /// Actual report diverges from its golden file.
    #[error("Report mismatch for fixture '{fixture}' ({report}):\n{diff}")]
    ReportMismatch {
        fixture: String,
        report: String,
        diff: Diff,
    },

    /// A fixture-specific invariant does not hold.
    #[error("Invariant violated for fixture '{fixture}' ({report}): {reason}")]
    InvariantViolated {
        fixture: String,
        report: String,
        reason: String,
    },

    // === Configuration ===
    /// Configuration file or value error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// `regenerate` was requested without an oracle command.
    #[error("No oracle command configured")]
    OracleNotConfigured,

    // === I/O ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Wrapped anyhow error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ConformanceError {
    /// True when the failure is a divergence between actual and expected output,
    /// as opposed to the harness being unable to produce a verdict.
    #[must_use]
    pub const fn is_mismatch(&self) -> bool {
        matches!(
            self,
            Self::ReportMismatch { .. } | Self::InvariantViolated { .. }
        )
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::GoldenMissing { .. } => {
                Some("Check in the golden file or run: rconf regenerate <fixture>")
            }
            Self::ReportMissing { .. } => {
                Some("Check that the subject writes reports into actual-reports/")
            }
            Self::FixtureRootMissing { .. } => Some("Pass --root or set features_root"),
            Self::FixtureNotFound { .. } => Some("Run: rconf list"),
            Self::OracleNotConfigured => Some("Set oracle_command in conformance.yaml"),
            Self::SubjectFailed { .. } => {
                Some("Inspect the fixture run log, or add the exit code to tolerated_exit_codes")
            }
            _ => None,
        }
    }

    /// Get the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        ErrorCode::of(self).exit_code()
    }
}

/// Result type using `ConformanceError`.
pub type Result<T> = std::result::Result<T, ConformanceError>;
