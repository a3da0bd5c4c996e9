//! Per-fixture report assertions and the fixture loop.
//!
//! For each fixture, stopping at the first failure:
//! 1. run the subject
//! 2. compare `json-report.json` against its golden file
//! 3. compare `messages.ndjson` against its golden file, masking run ids
//! 4. check the fixture's manifest invariants
//!
//! Fixtures run one at a time; each subprocess is awaited before the next
//! one starts.

use crate::compare::{compare_documents, compare_streams, compare_values};
use crate::config::HarnessConfig;
use crate::error::{ConformanceError, Result, StructuredError};
use crate::fixture::{Fixture, Invariant, select_fixtures};
use crate::mask::MaskTable;
use crate::report::{self, Document, JSON_REPORT, MESSAGES_REPORT, Side};
use crate::runner::{FixtureRunner, RunOutcome, RunRecord};
use crate::util::progress::ProgressTracker;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use tracing::{error, info};

/// Options for [`run_conformance`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Continue past failing fixtures instead of stopping at the first.
    pub keep_going: bool,
    /// Draw a progress bar on stderr.
    pub show_progress: bool,
}

/// Run one fixture and check every report it produced.
///
/// # Errors
///
/// Returns the first failure: subject error, missing or malformed report,
/// missing golden file, mismatch, or violated invariant.
pub fn assert_fixture(
    config: &HarnessConfig,
    runner: &dyn FixtureRunner,
    fixture: &Fixture,
) -> Result<RunRecord> {
    let record = runner.run(fixture)?;
    assert_json_report(config, fixture)?;
    assert_messages(config, fixture)?;
    check_invariants(config, fixture)?;
    Ok(record)
}

/// Compare the summary report. Only manifest mask entries apply.
///
/// # Errors
///
/// Returns a load error or [`ConformanceError::ReportMismatch`].
pub fn assert_json_report(config: &HarnessConfig, fixture: &Fixture) -> Result<()> {
    let expected = report::load_json(&fixture.golden_json(), Side::Expected)?;
    let actual = report::load_json(&fixture.actual(JSON_REPORT), Side::Actual)?;
    compare_values(&actual, &expected, &fixture.manifest.mask.json)
        .map_err(|diff| mismatch(config, fixture, JSON_REPORT, diff))
}

/// Compare the message stream with the harness mask plus manifest entries.
///
/// # Errors
///
/// Returns a load error or [`ConformanceError::ReportMismatch`].
pub fn assert_messages(config: &HarnessConfig, fixture: &Fixture) -> Result<()> {
    let expected = report::load_ndjson(&fixture.golden_messages(), Side::Expected)?;
    let actual = report::load_ndjson(&fixture.actual(MESSAGES_REPORT), Side::Actual)?;
    let mask = effective_message_mask(config, fixture);
    compare_streams(&actual, &expected, &mask)
        .map_err(|diff| mismatch(config, fixture, MESSAGES_REPORT, diff))
}

/// Run the manifest invariants in declaration order.
///
/// # Errors
///
/// Returns [`ConformanceError::InvariantViolated`] or a mismatch for the
/// first invariant that does not hold.
pub fn check_invariants(config: &HarnessConfig, fixture: &Fixture) -> Result<()> {
    for invariant in &fixture.manifest.invariants {
        let report_name = invariant.report();
        let actual = report::load_document(&fixture.actual(report_name), Side::Actual)?;
        match invariant {
            Invariant::Absent { text, .. } => {
                let serialized = serialize_document(&actual)?;
                if let Some(pos) = serialized.find(text.as_str()) {
                    return Err(violation(
                        fixture,
                        report_name,
                        format!("found {text:?} at offset {pos}"),
                    ));
                }
            }
            Invariant::Present { text, .. } => {
                let serialized = serialize_document(&actual)?;
                if !serialized.contains(text.as_str()) {
                    return Err(violation(
                        fixture,
                        report_name,
                        format!("{text:?} not found"),
                    ));
                }
            }
            Invariant::MatchesGolden { golden, mask, .. } => {
                let expected = report::load_document(&fixture.dir.join(golden), Side::Expected)?;
                compare_documents(&actual, &expected, mask)
                    .map_err(|diff| mismatch(config, fixture, report_name, diff))?;
            }
        }
    }
    Ok(())
}

/// Compact serialization used for substring invariants, so formatting and
/// escaping in the file do not matter.
fn serialize_document(doc: &Document) -> Result<String> {
    match doc {
        Document::Json(value) => Ok(serde_json::to_string(value)?),
        Document::Stream(lines) => {
            let mut out = Vec::with_capacity(lines.len());
            for line in lines {
                out.push(serde_json::to_string(line)?);
            }
            Ok(out.join("\n"))
        }
    }
}

fn mismatch(
    config: &HarnessConfig,
    fixture: &Fixture,
    report: &str,
    diff: crate::compare::Diff,
) -> ConformanceError {
    ConformanceError::ReportMismatch {
        fixture: fixture.name.clone(),
        report: report.to_string(),
        diff: diff.with_render_limit(config.max_diff_entries),
    }
}

fn violation(fixture: &Fixture, report: &str, reason: String) -> ConformanceError {
    ConformanceError::InvariantViolated {
        fixture: fixture.name.clone(),
        report: report.to_string(),
        reason,
    }
}

/// Verdict for one fixture.
#[derive(Debug, Clone, Serialize)]
pub struct FixtureResult {
    pub fixture: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<RunOutcome>,
    pub duration_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<StructuredError>,
}

/// Outcome of a whole conformance run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub selected: usize,
    pub passed: usize,
    pub failed: usize,
    /// Fixtures not reached because an earlier one failed.
    pub not_run: usize,
    pub results: Vec<FixtureResult>,
}

impl RunSummary {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.not_run == 0
    }

    /// First failing fixture, if any.
    #[must_use]
    pub fn first_failure(&self) -> Option<&FixtureResult> {
        self.results.iter().find(|r| !r.passed)
    }

    /// Process exit code: 0 on success, else the first failure's category.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.first_failure()
            .and_then(|r| r.error.as_ref())
            .map_or(0, |e| e.code.exit_code())
    }
}

/// Run every selected fixture through `runner`.
///
/// Per-fixture failures are recorded in the summary; the loop stops after
/// the first one unless `keep_going` is set.
///
/// # Errors
///
/// Returns an error only when fixtures cannot be selected.
pub fn run_conformance(
    config: &HarnessConfig,
    runner: &dyn FixtureRunner,
    options: RunOptions,
) -> Result<RunSummary> {
    let started_at = Utc::now();
    let names = select_fixtures(
        &config.features_root,
        &config.exclude,
        config.fixture_override.as_deref(),
    )?;
    info!(count = names.len(), "fixtures selected");

    let progress = ProgressTracker::new(names.len() as u64, "Running fixtures", options.show_progress);
    let mut results = Vec::with_capacity(names.len());

    for name in &names {
        progress.set_message(name);
        let start = Instant::now();
        let outcome = Fixture::open(&config.features_root, name)
            .and_then(|fixture| assert_fixture(config, runner, &fixture));
        let duration_ms = start.elapsed().as_millis();

        let result = match outcome {
            Ok(record) => {
                info!(fixture = %name, duration_ms, "fixture passed");
                FixtureResult {
                    fixture: name.clone(),
                    passed: true,
                    run: Some(record.outcome),
                    duration_ms,
                    error: None,
                }
            }
            Err(err) => {
                error!(fixture = %name, "{err}");
                FixtureResult {
                    fixture: name.clone(),
                    passed: false,
                    run: None,
                    duration_ms,
                    error: Some(StructuredError::from_error(&err)),
                }
            }
        };
        let failed = !result.passed;
        results.push(result);
        progress.inc(1);

        if failed && !options.keep_going {
            break;
        }
    }
    progress.finish_with_message("Fixtures complete");

    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;
    Ok(RunSummary {
        started_at,
        finished_at: Utc::now(),
        selected: names.len(),
        passed,
        failed,
        not_run: names.len() - results.len(),
        results,
    })
}

/// Build the mask a message stream comparison would use for `fixture`.
#[must_use]
pub fn effective_message_mask(config: &HarnessConfig, fixture: &Fixture) -> MaskTable {
    config.mask.merged(&fixture.manifest.mask.messages)
}
