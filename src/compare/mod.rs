//! Masked structural comparison of reports.
//!
//! Comparison rules:
//! - objects: key sets must be equal, values compared recursively
//! - arrays: compared element-wise in order, lengths must match
//! - scalars: strict equality (`1` and `1.0` differ)
//! - message streams: same length, line *i* against line *i*, never reordered
//!
//! Before a field is compared its dotted field path is looked up in the
//! [`MaskTable`]. An `ignore` entry makes the field equal unconditionally,
//! even when the key is missing on one side.
//!
//! All divergences are collected rather than stopping at the first one, so a
//! failure message can show the whole picture.

mod diff;

pub use diff::{DEFAULT_RENDER_LIMIT, Diff, DiffEntry, DiffKind};

use crate::mask::{MaskDirective, MaskTable, child_path};
use crate::report::Document;
use serde_json::{Map, Value};
use tracing::debug;

/// Compare two reports of any shape.
///
/// # Errors
///
/// Returns the [`Diff`] when the documents diverge outside masked fields.
pub fn compare_documents(
    actual: &Document,
    expected: &Document,
    mask: &MaskTable,
) -> Result<(), Diff> {
    match (actual, expected) {
        (Document::Json(actual), Document::Json(expected)) => {
            compare_values(actual, expected, mask)
        }
        (Document::Stream(actual), Document::Stream(expected)) => {
            compare_streams(actual, expected, mask)
        }
        _ => Diff::new(vec![DiffEntry {
            line: None,
            location: String::new(),
            kind: DiffKind::ShapeMismatch,
            expected: Some(Value::String(expected.kind_name().to_string())),
            actual: Some(Value::String(actual.kind_name().to_string())),
        }])
        .into_result(),
    }
}

/// Compare two JSON documents.
///
/// # Errors
///
/// Returns the [`Diff`] when the values diverge outside masked fields.
pub fn compare_values(actual: &Value, expected: &Value, mask: &MaskTable) -> Result<(), Diff> {
    let mut walker = Walker::new(mask, None);
    walker.value(actual, expected, "", "");
    walker.finish()
}

/// Compare two message streams position by position.
///
/// The same mask applies to every line. A length mismatch is reported along
/// with the divergences of the overlapping prefix.
///
/// # Errors
///
/// Returns the [`Diff`] when the streams differ in length or any line diverges.
pub fn compare_streams(
    actual: &[Value],
    expected: &[Value],
    mask: &MaskTable,
) -> Result<(), Diff> {
    let mut diff = Diff::default();
    let mut masked = 0usize;

    if actual.len() != expected.len() {
        diff.push(DiffEntry {
            line: None,
            location: String::new(),
            kind: DiffKind::LengthMismatch,
            expected: Some(Value::from(expected.len())),
            actual: Some(Value::from(actual.len())),
        });
    }

    for (idx, (a, e)) in actual.iter().zip(expected).enumerate() {
        let mut walker = Walker::new(mask, Some(idx + 1));
        walker.value(a, e, "", "");
        masked += walker.masked;
        for entry in walker.diff.entries() {
            diff.push(entry.clone());
        }
    }

    debug!(
        lines = actual.len().min(expected.len()),
        masked,
        diffs = diff.len(),
        "compared message streams"
    );
    diff.into_result()
}

/// Recursive tree walker carrying the field path (for masking) and the
/// index-bearing location (for reporting) side by side.
struct Walker<'a> {
    mask: &'a MaskTable,
    line: Option<usize>,
    diff: Diff,
    masked: usize,
}

impl<'a> Walker<'a> {
    fn new(mask: &'a MaskTable, line: Option<usize>) -> Self {
        Self {
            mask,
            line,
            diff: Diff::default(),
            masked: 0,
        }
    }

    fn finish(self) -> Result<(), Diff> {
        if self.line.is_none() {
            debug!(masked = self.masked, diffs = self.diff.len(), "compared documents");
        }
        self.diff.into_result()
    }

    fn record(
        &mut self,
        location: &str,
        kind: DiffKind,
        actual: Option<&Value>,
        expected: Option<&Value>,
    ) {
        self.diff.push(DiffEntry {
            line: self.line,
            location: location.to_string(),
            kind,
            expected: expected.cloned(),
            actual: actual.cloned(),
        });
    }

    fn value(&mut self, actual: &Value, expected: &Value, path: &str, location: &str) {
        match (actual, expected) {
            (Value::Object(a), Value::Object(e)) => self.object(a, e, path, location),
            (Value::Array(a), Value::Array(e)) => self.array(a, e, path, location),
            _ if json_type(actual) != json_type(expected) => {
                self.record(location, DiffKind::TypeMismatch, Some(actual), Some(expected));
            }
            _ if actual != expected => {
                self.record(location, DiffKind::ValueMismatch, Some(actual), Some(expected));
            }
            _ => {}
        }
    }

    fn object(
        &mut self,
        actual: &Map<String, Value>,
        expected: &Map<String, Value>,
        path: &str,
        location: &str,
    ) {
        for (key, e) in expected {
            let field = child_path(path, key);
            let loc = child_path(location, key);
            let a = actual.get(key);

            match self.mask.directive(&field) {
                Some(MaskDirective::Ignore) => {
                    self.masked += 1;
                    continue;
                }
                Some(MaskDirective::TypeOnly) => {
                    self.masked += 1;
                    self.type_only(a, Some(e), &loc);
                    continue;
                }
                None => {}
            }

            match a {
                Some(a) => self.value(a, e, &field, &loc),
                None => self.record(&loc, DiffKind::MissingKey, None, Some(e)),
            }
        }

        for (key, a) in actual {
            if expected.contains_key(key) {
                continue;
            }
            let field = child_path(path, key);
            let loc = child_path(location, key);
            match self.mask.directive(&field) {
                Some(MaskDirective::Ignore) => self.masked += 1,
                Some(MaskDirective::TypeOnly) => {
                    self.masked += 1;
                    self.type_only(Some(a), None, &loc);
                }
                None => self.record(&loc, DiffKind::ExtraKey, Some(a), None),
            }
        }
    }

    fn array(&mut self, actual: &[Value], expected: &[Value], path: &str, location: &str) {
        if actual.len() != expected.len() {
            self.record(
                location,
                DiffKind::LengthMismatch,
                Some(&Value::from(actual.len())),
                Some(&Value::from(expected.len())),
            );
        }
        for (idx, (a, e)) in actual.iter().zip(expected).enumerate() {
            self.value(a, e, path, &format!("{location}[{idx}]"));
        }
    }

    fn type_only(&mut self, actual: Option<&Value>, expected: Option<&Value>, location: &str) {
        match (actual, expected) {
            (Some(a), Some(e)) if json_type(a) == json_type(e) => {}
            (Some(_), Some(_)) => self.record(location, DiffKind::TypeMismatch, actual, expected),
            (None, Some(_)) => self.record(location, DiffKind::MissingKey, actual, expected),
            (Some(_), None) => self.record(location, DiffKind::ExtraKey, actual, expected),
            (None, None) => {}
        }
    }
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
