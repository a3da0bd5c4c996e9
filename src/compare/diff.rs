//! Diff entries produced by the structural comparator.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Default number of entries rendered in a failure message.
pub const DEFAULT_RENDER_LIMIT: usize = 20;

/// Longest rendering of a single value before it is elided.
const MAX_VALUE_CHARS: usize = 200;

/// Category of a divergence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    /// Same type, different value.
    ValueMismatch,
    /// Different JSON types (or a `type_only` mask failed).
    TypeMismatch,
    /// Key present in expected, absent in actual.
    MissingKey,
    /// Key present in actual, absent in expected.
    ExtraKey,
    /// Array or message stream lengths differ.
    LengthMismatch,
    /// A JSON document compared against a message stream.
    ShapeMismatch,
}

impl DiffKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValueMismatch => "value mismatch",
            Self::TypeMismatch => "type mismatch",
            Self::MissingKey => "missing key",
            Self::ExtraKey => "unexpected key",
            Self::LengthMismatch => "length mismatch",
            Self::ShapeMismatch => "shape mismatch",
        }
    }
}

/// A single divergence between actual and expected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffEntry {
    /// 1-based line of the message stream, when comparing streams.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Index-bearing location, e.g. `elements[0].steps[2].result.status`.
    pub location: String,
    pub kind: DiffKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
}

impl DiffEntry {
    /// Location prefixed with the stream line, `<root>` for the document itself.
    #[must_use]
    pub fn display_location(&self) -> String {
        let location = if self.location.is_empty() {
            "<root>"
        } else {
            self.location.as_str()
        };
        match self.line {
            Some(line) => format!("line {line}: {location}"),
            None => location.to_string(),
        }
    }
}

impl fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.display_location(), self.kind.as_str())?;
        write!(f, "\n    expected: {}", render_side(self.expected.as_ref()))?;
        write!(f, "\n    actual:   {}", render_side(self.actual.as_ref()))
    }
}

fn render_side(value: Option<&Value>) -> String {
    let Some(value) = value else {
        return "<absent>".to_string();
    };
    let rendered = serde_json::to_string(value).unwrap_or_else(|_| value.to_string());
    if rendered.chars().count() <= MAX_VALUE_CHARS {
        return rendered;
    }
    let head: String = rendered.chars().take(MAX_VALUE_CHARS).collect();
    format!("{head}...")
}

/// Every divergence found by one comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Diff {
    entries: Vec<DiffEntry>,
    render_limit: usize,
}

impl Default for Diff {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            render_limit: DEFAULT_RENDER_LIMIT,
        }
    }
}

impl Diff {
    #[must_use]
    pub fn new(entries: Vec<DiffEntry>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    /// Cap the number of entries shown by `Display`.
    #[must_use]
    pub fn with_render_limit(mut self, limit: usize) -> Self {
        self.render_limit = limit.max(1);
        self
    }

    pub fn push(&mut self, entry: DiffEntry) {
        self.entries.push(entry);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn entries(&self) -> &[DiffEntry] {
        &self.entries
    }

    /// First divergence in traversal order.
    #[must_use]
    pub fn first(&self) -> Option<&DiffEntry> {
        self.entries.first()
    }

    /// Convert into `Ok(())` when nothing diverged.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one entry was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} difference(s):", self.entries.len())?;
        for entry in self.entries.iter().take(self.render_limit) {
            write!(f, "\n  {entry}")?;
        }
        if self.entries.len() > self.render_limit {
            write!(f, "\n  ... and {} more", self.entries.len() - self.render_limit)?;
        }
        Ok(())
    }
}
