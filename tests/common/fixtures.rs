#![allow(dead_code)]

use serde_json::{Value, json};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Subject stand-in: copies every golden file into `actual-reports/`,
/// giving the run a fresh run id, then runs the fixture's `hook.sh` (if any)
/// inside the fixture directory. The hook's exit status becomes the
/// subject's.
pub const FAITHFUL_SUBJECT: &str = r#"#!/bin/sh
set -e
dir="features/$CONFORMANCE_FIXTURE"
mkdir -p "$dir/actual-reports"
for f in "$dir"/expected-reports/*; do
  name=$(basename "$f")
  sed "s/run-1/run-$$/g" "$f" > "$dir/actual-reports/$name"
done
if [ -f "$dir/hook.sh" ]; then
  (cd "$dir" && sh hook.sh) || exit $?
fi
"#;

/// A temporary harness root with `features/` and a directory for test logs.
pub struct Harness {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub features: PathBuf,
    pub test_log_dir: PathBuf,
}

impl Harness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = temp_dir.path().to_path_buf();
        let features = root.join("features");
        let test_log_dir = root.join("test-logs");
        fs::create_dir_all(&features).expect("features dir");
        fs::create_dir_all(&test_log_dir).expect("test log dir");
        Self {
            temp_dir,
            root,
            features,
            test_log_dir,
        }
    }

    /// `minimal`, `skipped` and `attachments`, plus the faithful subject
    /// wired up in `conformance.yaml`.
    pub fn with_standard_fixtures() -> Self {
        let harness = Self::new();
        harness.add_fixture("minimal", &minimal_report(), &minimal_messages());
        harness.add_fixture("skipped", &skipped_report(), &skipped_messages());
        add_attachments(&harness);
        harness.write_subject(FAITHFUL_SUBJECT);
        harness.write_config("command: [sh, subject.sh]\n");
        harness
    }

    pub fn fixture_dir(&self, name: &str) -> PathBuf {
        self.features.join(name)
    }

    pub fn expected(&self, name: &str, file: &str) -> PathBuf {
        self.fixture_dir(name).join("expected-reports").join(file)
    }

    pub fn actual(&self, name: &str, file: &str) -> PathBuf {
        self.fixture_dir(name).join("actual-reports").join(file)
    }

    pub fn add_fixture(&self, name: &str, report: &Value, messages: &[Value]) {
        let expected = self.fixture_dir(name).join("expected-reports");
        fs::create_dir_all(&expected).expect("expected dir");
        fs::write(
            self.fixture_dir(name).join(format!("{name}.feature")),
            format!("Feature: {name}\n"),
        )
        .expect("write feature");
        write_json(&expected.join("json-report.json"), report);
        write_ndjson(&expected.join("messages.ndjson"), messages);
    }

    pub fn write_manifest(&self, name: &str, yaml: &str) {
        fs::write(self.fixture_dir(name).join("fixture.yaml"), yaml).expect("write manifest");
    }

    /// Per-fixture behaviour for the faithful subject.
    pub fn write_hook(&self, name: &str, script: &str) {
        fs::write(self.fixture_dir(name).join("hook.sh"), script).expect("write hook");
    }

    pub fn write_subject(&self, script: &str) {
        fs::write(self.root.join("subject.sh"), script).expect("write subject");
    }

    pub fn write_config(&self, yaml: &str) {
        fs::write(self.root.join("conformance.yaml"), yaml).expect("write config");
    }
}

pub fn write_json(path: &std::path::Path, value: &Value) {
    let text = serde_json::to_string_pretty(value).expect("serialize");
    fs::write(path, text).expect("write json");
}

pub fn write_ndjson(path: &std::path::Path, lines: &[Value]) {
    let mut text = String::new();
    for line in lines {
        text.push_str(&line.to_string());
        text.push('\n');
    }
    fs::write(path, text).expect("write ndjson");
}

fn step(keyword: &str, name: &str, status: &str) -> Value {
    json!({
        "keyword": keyword,
        "name": name,
        "line": 4,
        "match": {"location": "steps.js:3"},
        "result": {"status": status, "duration": 1_000_000}
    })
}

pub fn minimal_report() -> Value {
    json!([{
        "id": "minimal",
        "uri": "features/minimal/minimal.feature",
        "keyword": "Feature",
        "name": "minimal",
        "line": 1,
        "elements": [
            {
                "id": "minimal;cukes",
                "keyword": "Scenario",
                "name": "cukes",
                "type": "scenario",
                "steps": [step("Given ", "I have 42 cukes in my belly", "passed")]
            },
            {
                "id": "minimal;more-cukes",
                "keyword": "Scenario",
                "name": "more cukes",
                "type": "scenario",
                "steps": [step("Given ", "I have 43 cukes in my belly", "passed")]
            }
        ]
    }])
}

fn run_messages(uri: &str, status: &str, success: bool) -> Vec<Value> {
    vec![
        json!({"meta": {"protocolVersion": "27.0.0", "implementation": {"name": "runner"}}}),
        json!({"source": {"uri": uri, "mediaType": "text/x.cucumber.gherkin+plain"}}),
        json!({"testRunStarted": {"id": "run-1", "timestamp": {"seconds": 0, "nanos": 0}}}),
        json!({"testCase": {"id": "tc-1", "pickleId": "p-1", "testRunStartedId": "run-1"}}),
        json!({"testStepFinished": {"testCaseStartedId": "tcs-1", "testStepResult": {"status": status}}}),
        json!({"testRunFinished": {"success": success, "testRunStartedId": "run-1"}}),
    ]
}

pub fn minimal_messages() -> Vec<Value> {
    run_messages("features/minimal/minimal.feature", "PASSED", true)
}

pub fn skipped_report() -> Value {
    json!([{
        "id": "skipped",
        "uri": "features/skipped/skipped.feature",
        "keyword": "Feature",
        "name": "skipped",
        "elements": [{
            "id": "skipped;skip-me",
            "keyword": "Scenario",
            "name": "skip me",
            "type": "scenario",
            "steps": [step("Given ", "a skipped step", "skipped")]
        }]
    }])
}

pub fn skipped_messages() -> Vec<Value> {
    run_messages("features/skipped/skipped.feature", "SKIPPED", true)
}

fn add_attachments(harness: &Harness) {
    let mut with_embeddings = step("When ", "a JPEG image is attached", "passed");
    with_embeddings["embeddings"] = json!([{"mime_type": "image/jpeg", "data": "/9j/4AAQ"}]);
    let report = json!([{
        "id": "attachments",
        "uri": "features/attachments/attachments.feature",
        "keyword": "Feature",
        "name": "attachments",
        "elements": [{
            "id": "attachments;jpeg",
            "keyword": "Scenario",
            "name": "jpeg",
            "type": "scenario",
            "steps": [with_embeddings]
        }]
    }]);
    let mut messages = run_messages("features/attachments/attachments.feature", "PASSED", true);
    messages.insert(
        4,
        json!({"attachment": {"mediaType": "image/jpeg", "body": "/9j/4AAQ", "contentEncoding": "BASE64"}}),
    );
    harness.add_fixture("attachments", &report, &messages);

    let mut stripped = report;
    stripped[0]["elements"][0]["steps"][0]
        .as_object_mut()
        .expect("step object")
        .remove("embeddings");
    write_json(
        &harness.expected("attachments", "json-report-no-attachments.json"),
        &stripped,
    );
    harness.write_manifest(
        "attachments",
        r#"description: attachments are embedded, and omitted from the no-attachments variant
invariants:
  - check: absent
    report: json-report-no-attachments.json
    text: '"embeddings"'
  - check: matches_golden
    report: json-report-no-attachments.json
    golden: expected-reports/json-report-no-attachments.json
"#,
    );
}
