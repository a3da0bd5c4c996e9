//! Field masking for report comparison.
//!
//! A [`MaskTable`] maps dotted field paths (`testRunStarted.id`) to a
//! [`MaskDirective`]. Paths never contain array indices: a field inside an
//! array element inherits the path of the array itself, so one entry covers
//! every element and every line of a message stream.
//!
//! Keys are joined with `.` and not escaped, so a key that itself contains a
//! dot shares its path with the nested field it spells: `{"a.b": 1}` and
//! `{"a": {"b": 1}}` are both addressed by the entry `a.b`.
//!
//! In YAML/JSON a table is a plain map. `null` and `"ignore"` both mean the
//! value is not compared and the key may be absent on either side.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Fields regenerated on every run of the subject: run identifiers and the
/// correlation ids that point back at them.
pub const STANDARD_MESSAGE_MASK: &[&str] = &[
    "testRunStarted.id",
    "testRunFinished.testRunStartedId",
    "testCase.testRunStartedId",
    "testRunHookStarted.id",
    "testRunHookStarted.testRunStartedId",
    "testRunHookFinished.testRunHookStartedId",
];

/// What to do with a masked field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskDirective {
    /// Value and presence are not checked.
    #[default]
    Ignore,
    /// Both sides must be present with the same JSON type; values are not compared.
    TypeOnly,
}

impl MaskDirective {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::TypeOnly => "type_only",
        }
    }
}

impl fmt::Display for MaskDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MaskDirective {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Ignore => serializer.serialize_none(),
            Self::TypeOnly => serializer.serialize_str(self.as_str()),
        }
    }
}

impl<'de> Deserialize<'de> for MaskDirective {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("ignore") => Ok(Self::Ignore),
            Some("type_only" | "type-only" | "type") => Ok(Self::TypeOnly),
            Some(other) => Err(serde::de::Error::custom(format!(
                "unknown mask directive '{other}' (expected null, ignore or type_only)"
            ))),
        }
    }
}

/// Mapping from field path to masking directive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaskTable {
    entries: BTreeMap<String, MaskDirective>,
}

impl MaskTable {
    /// An empty table: every field is compared.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The table applied to message streams unless configured otherwise.
    #[must_use]
    pub fn standard() -> Self {
        Self::ignoring(STANDARD_MESSAGE_MASK.iter().copied())
    }

    /// Build a table that ignores each of `paths`.
    pub fn ignoring<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = paths
            .into_iter()
            .map(|path| (path.into(), MaskDirective::Ignore))
            .collect();
        Self { entries }
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, path: impl Into<String>, directive: MaskDirective) {
        self.entries.insert(path.into(), directive);
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, path: impl Into<String>, directive: MaskDirective) -> Self {
        self.insert(path, directive);
        self
    }

    /// Layer `other` on top of this table (entries in `other` win).
    pub fn merge_from(&mut self, other: &Self) {
        for (path, directive) in &other.entries {
            self.entries.insert(path.clone(), *directive);
        }
    }

    /// Return a new table with `other` layered on top.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        merged.merge_from(other);
        merged
    }

    /// Look up the directive for a field path.
    #[must_use]
    pub fn directive(&self, path: &str) -> Option<MaskDirective> {
        self.entries.get(path).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, MaskDirective)> {
        self.entries.iter().map(|(path, d)| (path.as_str(), *d))
    }
}

/// Extend a dotted field path with an object key.
#[must_use]
pub fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}
