use crate::compare::{Diff, DiffEntry};
use crate::fixture::Fixture;
use crate::oracle::Regenerated;
use serde::Serialize;
use std::path::PathBuf;

/// A fixture as shown by `list`.
#[derive(Debug, Clone, Serialize)]
pub struct FixtureEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub has_manifest: bool,
    pub golden_present: bool,
    pub invariants: usize,
}

impl FixtureEntry {
    #[must_use]
    pub fn from_fixture(fixture: &Fixture) -> Self {
        Self {
            name: fixture.name.clone(),
            description: fixture.manifest.description.clone(),
            has_manifest: fixture.dir.join(crate::fixture::MANIFEST_FILE).is_file(),
            golden_present: fixture.golden_json().is_file() && fixture.golden_messages().is_file(),
            invariants: fixture.manifest.invariants.len(),
        }
    }
}

/// Result of comparing two report files.
#[derive(Debug, Clone, Serialize)]
pub struct CompareOutput {
    pub actual: PathBuf,
    pub expected: PathBuf,
    pub equal: bool,
    pub difference_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub differences: Vec<DiffEntry>,
}

impl CompareOutput {
    #[must_use]
    pub fn new(actual: PathBuf, expected: PathBuf, diff: Option<&Diff>) -> Self {
        let differences = diff.map(|d| d.entries().to_vec()).unwrap_or_default();
        Self {
            actual,
            expected,
            equal: differences.is_empty(),
            difference_count: differences.len(),
            differences,
        }
    }
}

/// Golden files written by `regenerate`.
#[derive(Debug, Clone, Serialize)]
pub struct RegenerateOutput {
    pub fixture: String,
    pub written: Vec<PathBuf>,
}

impl From<Regenerated> for RegenerateOutput {
    fn from(value: Regenerated) -> Self {
        Self {
            fixture: value.fixture,
            written: vec![value.json_report, value.messages],
        }
    }
}
