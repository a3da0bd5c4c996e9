//! Per-fixture manifest (`fixture.yaml`).
//!
//! Declares everything that makes a fixture special instead of matching on
//! fixture names in the orchestration code:
//!
//! ```yaml
//! golden:
//!   messages: expected-reports/messages-reference.ndjson
//! mask:
//!   messages:
//!     testRunHookFinished.result.message: null
//! tolerated_exit_codes: [1]
//! invariants:
//!   - check: absent
//!     report: json-report-no-attachments.json
//!     text: '"embeddings"'
//! ```
//!
//! Paths are relative to the fixture directory. A missing manifest is the
//! same as an empty one.

use crate::error::{ConformanceError, Result};
use crate::mask::MaskTable;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File name of the manifest inside a fixture directory.
pub const MANIFEST_FILE: &str = "fixture.yaml";

/// Golden-file overrides, relative to the fixture directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GoldenOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<PathBuf>,
}

/// Extra mask entries layered over the harness defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureMasks {
    #[serde(default, skip_serializing_if = "MaskTable::is_empty")]
    pub json: MaskTable,
    #[serde(default, skip_serializing_if = "MaskTable::is_empty")]
    pub messages: MaskTable,
}

/// A fixture-specific check run after both report comparisons pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Invariant {
    /// `report` (in `actual-reports/`) must not contain `text` anywhere.
    Absent { report: String, text: String },
    /// `report` (in `actual-reports/`) must contain `text`.
    Present { report: String, text: String },
    /// `report` (in `actual-reports/`) must structurally match `golden`.
    MatchesGolden {
        report: String,
        golden: PathBuf,
        #[serde(default, skip_serializing_if = "MaskTable::is_empty")]
        mask: MaskTable,
    },
}

impl Invariant {
    /// Name of the actual report the invariant inspects.
    #[must_use]
    pub fn report(&self) -> &str {
        match self {
            Self::Absent { report, .. }
            | Self::Present { report, .. }
            | Self::MatchesGolden { report, .. } => report,
        }
    }
}

/// Parsed `fixture.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub golden: GoldenOverrides,
    #[serde(default)]
    pub mask: FixtureMasks,
    /// Replaces the harness-wide tolerated exit codes for this fixture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerated_exit_codes: Option<Vec<i32>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invariants: Vec<Invariant>,
}

impl FixtureManifest {
    /// Load the manifest from a fixture directory. Missing file → default.
    ///
    /// # Errors
    ///
    /// Returns [`ConformanceError::Manifest`] if the file exists but is not a
    /// valid manifest.
    pub fn load(fixture_dir: &Path) -> Result<Self> {
        let path = fixture_dir.join(MANIFEST_FILE);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };
        Self::parse(&contents, &path)
    }

    /// Parse manifest text. `path` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ConformanceError::Manifest`] on invalid YAML or unknown keys.
    pub fn parse(contents: &str, path: &Path) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let manifest: Self =
            serde_yaml::from_str(contents).map_err(|e| ConformanceError::Manifest {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        manifest.validate(path)?;
        Ok(manifest)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let overrides = [self.golden.json.as_ref(), self.golden.messages.as_ref()];
        let goldens = self.invariants.iter().filter_map(|inv| match inv {
            Invariant::MatchesGolden { golden, .. } => Some(golden),
            _ => None,
        });
        for golden in overrides.into_iter().flatten().chain(goldens) {
            if golden.is_absolute()
                || golden
                    .components()
                    .any(|c| matches!(c, std::path::Component::ParentDir))
            {
                return Err(ConformanceError::Manifest {
                    path: path.to_path_buf(),
                    reason: format!(
                        "golden path '{}' must stay inside the fixture directory",
                        golden.display()
                    ),
                });
            }
        }
        for invariant in &self.invariants {
            let report = invariant.report();
            if report.is_empty() || report.contains('/') || report.contains('\\') {
                return Err(ConformanceError::Manifest {
                    path: path.to_path_buf(),
                    reason: format!("invariant report '{report}' must be a plain file name"),
                });
            }
        }
        Ok(())
    }
}
