//! Regenerating golden files with the reference implementation.
//!
//! This is the only code path that writes into `expected-reports/`. The
//! oracle command runs with the fixture selector bound like the subject,
//! [`OUTPUT_DIR_ENV`] naming the directory it must write into, and
//! [`GOLDEN_JSON_ENV`] / [`GOLDEN_MESSAGES_ENV`] naming the exact golden files
//! (manifest overrides included). Both golden files are removed before the
//! oracle starts, so a run that writes nothing cannot pass on stale files.

use crate::config::{GOLDEN_JSON_ENV, GOLDEN_MESSAGES_ENV, HarnessConfig, OUTPUT_DIR_ENV};
use crate::error::{ConformanceError, Result};
use crate::fixture::Fixture;
use crate::report::{self, Side};
use crate::runner::Invocation;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Golden files written by one oracle run.
#[derive(Debug, Clone)]
pub struct Regenerated {
    pub fixture: String,
    pub json_report: PathBuf,
    pub messages: PathBuf,
}

/// Run the oracle for `fixture` and check both golden files were written.
///
/// # Errors
///
/// - [`ConformanceError::OracleNotConfigured`] without `oracle_command`
/// - [`ConformanceError::SubjectFailed`] if the oracle exits nonzero
/// - [`ConformanceError::GoldenMissing`] if a golden file is still missing
///   afterwards, or parse errors if it is malformed
pub fn regenerate(config: &HarnessConfig, fixture: &Fixture) -> Result<Regenerated> {
    let argv = config
        .oracle_command
        .clone()
        .ok_or(ConformanceError::OracleNotConfigured)?;

    let expected_dir = fixture.expected_dir();
    fs::create_dir_all(&expected_dir)?;

    let json_report = fixture.golden_json();
    let messages = fixture.golden_messages();
    clear_golden(&json_report)?;
    clear_golden(&messages)?;

    let invocation = Invocation {
        argv,
        cwd: config.root.clone(),
        env: vec![
            (config.selector_env.clone(), fixture.name.clone()),
            (
                OUTPUT_DIR_ENV.to_string(),
                expected_dir.to_string_lossy().to_string(),
            ),
            (
                GOLDEN_JSON_ENV.to_string(),
                json_report.to_string_lossy().to_string(),
            ),
            (
                GOLDEN_MESSAGES_ENV.to_string(),
                messages.to_string_lossy().to_string(),
            ),
        ],
    };
    info!(fixture = %fixture.name, "regenerating golden files");
    let captured =
        invocation.execute(Some(&config.log_dir), &format!("oracle-{}", fixture.name))?;

    if !captured.status.success() {
        return Err(ConformanceError::SubjectFailed {
            fixture: fixture.name.clone(),
            exit: format!("oracle {}", captured.status),
            stderr_tail: captured.stderr,
        });
    }

    report::load_json(&json_report, Side::Expected)?;
    report::load_ndjson(&messages, Side::Expected)?;

    Ok(Regenerated {
        fixture: fixture.name.clone(),
        json_report,
        messages,
    })
}

/// Remove a golden file ahead of regeneration and make sure its directory
/// exists.
fn clear_golden(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed previous golden"),
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => return Err(err.into()),
    }
    Ok(())
}
