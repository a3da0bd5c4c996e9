use assert_cmd::Command;
use std::ffi::OsStr;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};

use super::fixtures::Harness;

#[derive(Debug)]
pub struct RconfRun {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
    pub duration: Duration,
    pub log_path: PathBuf,
}

impl RconfRun {
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|e| panic!("stdout is not JSON ({e}):\n{}", self.stdout))
    }
}

pub fn run_rconf<I, S>(harness: &Harness, args: I, label: &str) -> RconfRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_rconf_with_env(harness, args, std::iter::empty::<(String, String)>(), label)
}

pub fn run_rconf_with_env<I, S, E, K, V>(
    harness: &Harness,
    args: I,
    env_vars: E,
    label: &str,
) -> RconfRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
    E: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("rconf"));
    cmd.current_dir(&harness.root);
    for key in [
        "CONFORMANCE_FIXTURE",
        "CONFORMANCE_COMMAND",
        "CONFORMANCE_EXCLUDE",
        "CONFORMANCE_FEATURES_ROOT",
        "CONFORMANCE_LOG_DIR",
        "CONFORMANCE_ROOT",
        "CONFORMANCE_ORACLE_COMMAND",
        "CONFORMANCE_SELECTOR_ENV",
        "CONFORMANCE_TOLERATED_EXIT_CODES",
        "CONFORMANCE_EXPECTED_FAILURE_PATTERN",
        "CONFORMANCE_MAX_DIFF_ENTRIES",
        "CONFORMANCE_OUTPUT_DIR",
        "CONFORMANCE_GOLDEN_JSON",
        "CONFORMANCE_GOLDEN_MESSAGES",
        "RCONF_LOG_FORMAT",
    ] {
        cmd.env_remove(key);
    }
    cmd.args(args);
    cmd.envs(env_vars);
    cmd.env("NO_COLOR", "1");
    cmd.env("RUST_LOG", "report_conformance=debug");
    cmd.env("RUST_BACKTRACE", "1");

    let start = Instant::now();
    let output = cmd.output().expect("run rconf");
    let duration = start.elapsed();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let log_path = harness.test_log_dir.join(format!("{label}.log"));
    let log_body = format!(
        "label: {label}\nstarted: {:?}\nduration: {:?}\nstatus: {}\nargs: {:?}\ncwd: {}\n\nstdout:\n{}\n\nstderr:\n{}\n",
        SystemTime::now(),
        duration,
        output.status,
        cmd.get_args().collect::<Vec<_>>(),
        harness.root.display(),
        stdout,
        stderr
    );
    fs::write(&log_path, log_body).expect("write log");

    RconfRun {
        stdout,
        stderr,
        status: output.status,
        duration,
        log_path,
    }
}
