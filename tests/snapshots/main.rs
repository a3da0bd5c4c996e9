//! Snapshots of machine-readable output.

#[path = "../common/mod.rs"]
mod common;

use common::fixtures::{
    Harness, minimal_messages, minimal_report, skipped_messages, skipped_report,
};
use common::test_log;
use insta::assert_json_snapshot;
use report_conformance::assertions::{RunOptions, run_conformance};
use report_conformance::config::{ConfigLayer, HarnessConfig};
use report_conformance::fixture::Fixture;
use report_conformance::runner::{FixtureRunner, RunOutcome, RunRecord};
use report_conformance::{ConformanceError, Result};
use serde_json::Value;
use std::fs;
use std::time::Duration;

/// Copies goldens into `actual-reports/`, flipping SKIPPED to PASSED.
struct FlippingRunner;

impl FixtureRunner for FlippingRunner {
    fn run(&self, fixture: &Fixture) -> Result<RunRecord> {
        fs::create_dir_all(fixture.actual_dir())?;
        for entry in fs::read_dir(fixture.expected_dir())? {
            let entry = entry?;
            let text = fs::read_to_string(entry.path())?.replace("SKIPPED", "PASSED");
            fs::write(fixture.actual_dir().join(entry.file_name()), text)?;
        }
        Ok(RunRecord {
            fixture: fixture.name.clone(),
            outcome: RunOutcome::Passed,
            duration: Duration::ZERO,
            log_path: None,
        })
    }
}

/// Replace run-dependent values with stable placeholders.
fn normalize_json(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                match key.as_str() {
                    "started_at" | "finished_at" => *v = Value::from("[timestamp]"),
                    "duration_ms" => *v = Value::from("[duration]"),
                    _ => normalize_json(v),
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(normalize_json),
        _ => {}
    }
}

#[test]
fn snapshot_fail_fast_run_summary() {
    let _log = test_log("snapshot_fail_fast_run_summary");
    let harness = Harness::new();
    harness.add_fixture("minimal", &minimal_report(), &minimal_messages());
    harness.add_fixture("skipped", &skipped_report(), &skipped_messages());
    harness.add_fixture("zzz-unreached", &minimal_report(), &minimal_messages());
    let config = HarnessConfig::resolve(&harness.root, &ConfigLayer::default()).expect("config");

    let summary = run_conformance(&config, &FlippingRunner, RunOptions::default()).expect("run");
    let mut json = serde_json::to_value(&summary).expect("serialize");
    normalize_json(&mut json);

    assert_json_snapshot!(json, @r###"
    {
      "failed": 1,
      "finished_at": "[timestamp]",
      "not_run": 1,
      "passed": 1,
      "results": [
        {
          "duration_ms": "[duration]",
          "fixture": "minimal",
          "passed": true,
          "run": {
            "outcome": "passed"
          }
        },
        {
          "duration_ms": "[duration]",
          "error": {
            "code": "REPORT_MISMATCH",
            "context": {
              "diff_count": 1,
              "diffs": [
                {
                  "actual": "PASSED",
                  "expected": "SKIPPED",
                  "kind": "value_mismatch",
                  "line": 5,
                  "location": "testStepFinished.testStepResult.status"
                }
              ],
              "fixture": "skipped",
              "report": "messages.ndjson"
            },
            "message": "Report mismatch for fixture 'skipped' (messages.ndjson):\n1 difference(s):\n  line 5: testStepFinished.testStepResult.status: value mismatch\n    expected: \"SKIPPED\"\n    actual:   \"PASSED\""
          },
          "fixture": "skipped",
          "passed": false
        }
      ],
      "selected": 3,
      "started_at": "[timestamp]"
    }
    "###);
}

#[test]
fn snapshot_structured_error_for_missing_golden() {
    let _log = test_log("snapshot_structured_error_for_missing_golden");
    let err = ConformanceError::GoldenMissing {
        path: "features/minimal/expected-reports/messages.ndjson".into(),
    };
    let json = report_conformance::StructuredError::from_error(&err).to_json();
    assert_json_snapshot!(json, @r###"
    {
      "error": {
        "code": "GOLDEN_MISSING",
        "context": {
          "path": "features/minimal/expected-reports/messages.ndjson"
        },
        "hint": "Check in the golden file or run: rconf regenerate <fixture>",
        "message": "Golden file not found: 'features/minimal/expected-reports/messages.ndjson'"
      }
    }
    "###);
}
