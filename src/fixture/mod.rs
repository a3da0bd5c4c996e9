//! Fixture directories and their enumeration.
//!
//! Layout under the fixture root (default `features/`):
//!
//! ```text
//! features/<name>/
//!   *.feature, step definitions      (opaque to the harness)
//!   fixture.yaml                     (optional manifest)
//!   expected-reports/                (golden files, never written by `run`)
//!   actual-reports/                  (rewritten by every run of the subject)
//! ```

pub mod manifest;

pub use manifest::{FixtureManifest, GoldenOverrides, Invariant, MANIFEST_FILE};

use crate::error::{ConformanceError, Result};
use crate::report::{JSON_REPORT, MESSAGES_REPORT};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Golden files directory inside a fixture.
pub const EXPECTED_DIR: &str = "expected-reports";
/// Directory the subject writes into.
pub const ACTUAL_DIR: &str = "actual-reports";

/// A fixture directory plus its manifest.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub name: String,
    pub dir: PathBuf,
    pub manifest: FixtureManifest,
}

impl Fixture {
    /// Open `root/<name>` and load its manifest.
    ///
    /// # Errors
    ///
    /// Returns [`ConformanceError::Config`] if `name` is not a single directory
    /// name, [`ConformanceError::FixtureNotFound`] if the directory does not
    /// exist, or a manifest error.
    pub fn open(root: &Path, name: &str) -> Result<Self> {
        check_fixture_name(name)?;
        let dir = root.join(name);
        if !dir.is_dir() {
            return Err(ConformanceError::FixtureNotFound {
                name: name.to_string(),
                root: root.to_path_buf(),
            });
        }
        let manifest = FixtureManifest::load(&dir)?;
        Ok(Self {
            name: name.to_string(),
            dir,
            manifest,
        })
    }

    #[must_use]
    pub fn expected_dir(&self) -> PathBuf {
        self.dir.join(EXPECTED_DIR)
    }

    #[must_use]
    pub fn actual_dir(&self) -> PathBuf {
        self.dir.join(ACTUAL_DIR)
    }

    /// Path of a report produced by the subject.
    #[must_use]
    pub fn actual(&self, file: &str) -> PathBuf {
        self.actual_dir().join(file)
    }

    /// Golden summary report, honoring the manifest override.
    #[must_use]
    pub fn golden_json(&self) -> PathBuf {
        self.manifest.golden.json.as_ref().map_or_else(
            || self.expected_dir().join(JSON_REPORT),
            |path| self.dir.join(path),
        )
    }

    /// Golden message stream, honoring the manifest override.
    #[must_use]
    pub fn golden_messages(&self) -> PathBuf {
        self.manifest.golden.messages.as_ref().map_or_else(
            || self.expected_dir().join(MESSAGES_REPORT),
            |path| self.dir.join(path),
        )
    }
}

/// A fixture name must be exactly one normal path component, so that the
/// fixture directory (and its `actual-reports/`) stays directly under the root.
fn check_fixture_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if single_normal && !name.contains(['/', '\\']) {
        return Ok(());
    }
    Err(ConformanceError::Config(format!(
        "fixture name '{name}' must be a single directory name under the fixture root"
    )))
}

/// List immediate subdirectories of `root`, minus `exclude`.
///
/// Hidden directories are skipped; the result is sorted by name.
///
/// # Errors
///
/// Returns [`ConformanceError::FixtureRootMissing`] if `root` is not a
/// directory, or an I/O error while reading it.
pub fn list_fixtures(root: &Path, exclude: &BTreeSet<String>) -> Result<Vec<String>> {
    if !root.is_dir() {
        return Err(ConformanceError::FixtureRootMissing {
            path: root.to_path_buf(),
        });
    }

    let mut names = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            ConformanceError::Io(e.into_io_error().unwrap_or_else(|| {
                std::io::Error::other(format!("failed to read '{}'", root.display()))
            }))
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            debug!(path = %entry.path().display(), "skipping non-UTF-8 fixture name");
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        if exclude.contains(name) {
            debug!(fixture = name, "excluded");
            continue;
        }
        names.push(name.to_string());
    }
    names.sort();
    Ok(names)
}

/// Fixtures to run: the override alone when set, otherwise [`list_fixtures`].
///
/// The override wins even over the exclusion list.
///
/// # Errors
///
/// See [`list_fixtures`]. An override that is not a single directory name is
/// a [`ConformanceError::Config`]; a missing directory is reported when the
/// fixture is opened.
pub fn select_fixtures(
    root: &Path,
    exclude: &BTreeSet<String>,
    fixture_override: Option<&str>,
) -> Result<Vec<String>> {
    match fixture_override.map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => {
            check_fixture_name(name)?;
            debug!(fixture = name, "fixture override set, skipping enumeration");
            Ok(vec![name.to_string()])
        }
        None => list_fixtures(root, exclude),
    }
}
