//! Loading report files.
//!
//! Two formats are produced by the subject:
//! - the summary report, a single JSON document (`json-report.json`)
//! - the message stream, newline-delimited JSON (`messages.ndjson`), one event
//!   per line, order significant
//!
//! Blank lines in ndjson (including the trailing newline) are skipped; line
//! numbers in errors are 1-based positions in the file.

use crate::error::{ConformanceError, Result};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Summary report file name.
pub const JSON_REPORT: &str = "json-report.json";
/// Message stream file name.
pub const MESSAGES_REPORT: &str = "messages.ndjson";

/// On-disk format of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Ndjson,
}

impl ReportFormat {
    /// Detect the format from the file extension; anything not `.ndjson` or
    /// `.jsonl` is treated as a single JSON document.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("ndjson" | "jsonl") => Self::Ndjson,
            _ => Self::Json,
        }
    }
}

/// A parsed report.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    /// Summary report.
    Json(Value),
    /// Message stream, one value per non-blank line.
    Stream(Vec<Value>),
}

impl Document {
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Json(_) => "json document",
            Self::Stream(_) => "message stream",
        }
    }

    /// Parse text in the given format. `path` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns a parse error naming the file (and line, for ndjson).
    pub fn parse(text: &str, format: ReportFormat, path: &Path) -> Result<Self> {
        match format {
            ReportFormat::Json => parse_json(text, path).map(Self::Json),
            ReportFormat::Ndjson => parse_ndjson(text, path).map(Self::Stream),
        }
    }
}

/// Which side of the comparison a file belongs to; decides the error raised
/// when it does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Produced by the subject into `actual-reports/`.
    Actual,
    /// Golden file in `expected-reports/`.
    Expected,
}

/// Load a report, choosing the format from the extension.
///
/// # Errors
///
/// - [`ConformanceError::GoldenMissing`] for a missing expected file
/// - [`ConformanceError::ReportMissing`] for a missing actual file
/// - parse errors for malformed content
pub fn load_document(path: &Path, side: Side) -> Result<Document> {
    let text = read_report(path, side)?;
    Document::parse(&text, ReportFormat::from_path(path), path)
}

/// Load a summary report.
///
/// # Errors
///
/// See [`load_document`].
pub fn load_json(path: &Path, side: Side) -> Result<Value> {
    let text = read_report(path, side)?;
    parse_json(&text, path)
}

/// Load a message stream.
///
/// # Errors
///
/// See [`load_document`].
pub fn load_ndjson(path: &Path, side: Side) -> Result<Vec<Value>> {
    let text = read_report(path, side)?;
    parse_ndjson(&text, path)
}

/// Read a report as raw text, mapping "not found" to the side-specific error.
///
/// # Errors
///
/// See [`load_document`].
pub fn read_report(path: &Path, side: Side) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(err) if err.kind() == ErrorKind::NotFound => Err(match side {
            Side::Actual => ConformanceError::ReportMissing {
                path: path.to_path_buf(),
            },
            Side::Expected => ConformanceError::GoldenMissing {
                path: path.to_path_buf(),
            },
        }),
        Err(err) => Err(err.into()),
    }
}

fn parse_json(text: &str, path: &Path) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| ConformanceError::JsonParse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn parse_ndjson(text: &str, path: &Path) -> Result<Vec<Value>> {
    let mut records = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let value = serde_json::from_str(trimmed).map_err(|e| ConformanceError::NdjsonParse {
            path: path.to_path_buf(),
            line: idx + 1,
            reason: e.to_string(),
        })?;
        records.push(value);
    }
    Ok(records)
}
