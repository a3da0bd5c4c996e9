//! Running the subject for one fixture.
//!
//! The subject is spawned once per fixture with the selector variable bound
//! to the fixture name for that child only; the harness environment is never
//! mutated. The call blocks until the child exits.
//!
//! Exit handling is classified by exit code, not by message text:
//! - `0` passes
//! - a tolerated code (default `1`, "scenarios failed") is an expected
//!   failure: some fixtures are designed to end in a failing run
//! - anything else, including death by signal, is a hard error
//!
//! When `expected_failure_pattern` is configured, an expected failure must
//! also match it on stderr.

use crate::config::HarnessConfig;
use crate::error::{ConformanceError, Result};
use crate::fixture::Fixture;
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Lines of stderr kept in a `SubjectFailed` error.
const STDERR_TAIL_LINES: usize = 20;

/// How a finished subject run is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Exit code 0.
    Passed,
    /// A tolerated nonzero exit; the reports are still compared.
    ExpectedFailure { exit_code: i32 },
}

/// Result of classifying an exit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitClass {
    Passed,
    ExpectedFailure(i32),
    Unexpected(String),
}

/// Classify a finished process.
///
/// `code` is `None` when the process was terminated by a signal.
#[must_use]
pub fn classify_exit(
    code: Option<i32>,
    stderr: &str,
    tolerated: &[i32],
    pattern: Option<&Regex>,
) -> ExitClass {
    match code {
        Some(0) => ExitClass::Passed,
        Some(code) if tolerated.contains(&code) => match pattern {
            Some(re) if !re.is_match(stderr) => ExitClass::Unexpected(format!(
                "exit code {code} without the expected failure signature /{re}/"
            )),
            _ => ExitClass::ExpectedFailure(code),
        },
        Some(code) => ExitClass::Unexpected(format!("exit code {code}")),
        None => ExitClass::Unexpected("terminated by signal".to_string()),
    }
}

/// A completed fixture run.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub fixture: String,
    #[serde(flatten)]
    pub outcome: RunOutcome,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u128(d.as_millis())
    }
}

/// Runs the subject for a fixture and leaves its reports in `actual-reports/`.
pub trait FixtureRunner {
    /// # Errors
    ///
    /// Returns an error if the subject cannot be started or exits in an
    /// untolerated way.
    fn run(&self, fixture: &Fixture) -> Result<RunRecord>;
}

/// Captured output of one child process.
#[derive(Debug)]
pub struct CapturedRun {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
    pub log_path: Option<PathBuf>,
}

/// A child process invocation: argv, working directory, extra environment.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub argv: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
}

impl Invocation {
    fn display(&self) -> String {
        self.argv.join(" ")
    }

    /// Spawn, wait, and write a log file under `log_dir` named `label.log`.
    ///
    /// # Errors
    ///
    /// Returns [`ConformanceError::SpawnFailed`] if the process cannot start.
    pub fn execute(&self, log_dir: Option<&Path>, label: &str) -> Result<CapturedRun> {
        let Some((program, args)) = self.argv.split_first() else {
            return Err(ConformanceError::Config("empty command".to_string()));
        };

        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd.current_dir(&self.cwd);
        cmd.envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        debug!(command = %self.display(), cwd = %self.cwd.display(), env = ?self.env, "spawning");
        let start = Instant::now();
        let output = cmd.output().map_err(|source| ConformanceError::SpawnFailed {
            command: self.display(),
            source,
        })?;
        let duration = start.elapsed();

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        let log_path = match log_dir {
            Some(dir) => Some(self.write_log(dir, label, &output.status, duration, &stdout, &stderr)?),
            None => None,
        };

        Ok(CapturedRun {
            status: output.status,
            stdout,
            stderr,
            duration,
            log_path,
        })
    }

    fn write_log(
        &self,
        log_dir: &Path,
        label: &str,
        status: &ExitStatus,
        duration: Duration,
        stdout: &str,
        stderr: &str,
    ) -> Result<PathBuf> {
        fs::create_dir_all(log_dir)?;
        let log_path = log_dir.join(format!("{label}.log"));
        let timestamp = chrono::Utc::now().to_rfc3339();
        let log_body = format!(
            "label: {label}\nfinished: {}\nduration: {:?}\nstatus: {}\nargs: {:?}\ncwd: {}\nenv: {:?}\n\nstdout:\n{}\n\nstderr:\n{}\n",
            timestamp,
            duration,
            status,
            self.argv,
            self.cwd.display(),
            self.env,
            stdout,
            stderr
        );
        fs::write(&log_path, log_body)?;
        Ok(log_path)
    }
}

/// Runs the configured subject command as a child process.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    argv: Vec<String>,
    cwd: PathBuf,
    selector_env: String,
    tolerated: Vec<i32>,
    failure_pattern: Option<Regex>,
    log_dir: Option<PathBuf>,
}

impl CommandRunner {
    /// Build a runner from the harness configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConformanceError::Config`] when no subject command is set or
    /// the failure pattern is invalid.
    pub fn from_config(config: &HarnessConfig) -> Result<Self> {
        if config.command.is_empty() {
            return Err(ConformanceError::Config(
                "no subject command configured (set `command` in conformance.yaml or CONFORMANCE_COMMAND)"
                    .to_string(),
            ));
        }
        let failure_pattern = config
            .expected_failure_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| ConformanceError::Config(format!("expected_failure_pattern: {e}")))?;

        Ok(Self {
            argv: config.command.clone(),
            cwd: config.root.clone(),
            selector_env: config.selector_env.clone(),
            tolerated: config.tolerated_exit_codes.clone(),
            failure_pattern,
            log_dir: Some(config.log_dir.clone()),
        })
    }

    /// Disable per-fixture log files.
    #[must_use]
    pub fn without_logs(mut self) -> Self {
        self.log_dir = None;
        self
    }
}

impl FixtureRunner for CommandRunner {
    fn run(&self, fixture: &Fixture) -> Result<RunRecord> {
        reset_actual_dir(&fixture.actual_dir())?;

        let invocation = Invocation {
            argv: self.argv.clone(),
            cwd: self.cwd.clone(),
            env: vec![(self.selector_env.clone(), fixture.name.clone())],
        };
        info!(fixture = %fixture.name, command = %invocation.display(), "running subject");
        let captured = invocation.execute(self.log_dir.as_deref(), &fixture.name)?;

        let tolerated = fixture
            .manifest
            .tolerated_exit_codes
            .as_deref()
            .unwrap_or(&self.tolerated);
        let class = classify_exit(
            captured.status.code(),
            &captured.stderr,
            tolerated,
            self.failure_pattern.as_ref(),
        );
        debug!(fixture = %fixture.name, status = %captured.status, ?class, "subject finished");

        let outcome = match class {
            ExitClass::Passed => RunOutcome::Passed,
            ExitClass::ExpectedFailure(exit_code) => {
                info!(fixture = %fixture.name, exit_code, "subject reported failing scenarios (tolerated)");
                RunOutcome::ExpectedFailure { exit_code }
            }
            ExitClass::Unexpected(exit) => {
                warn!(fixture = %fixture.name, %exit, "subject failed");
                return Err(ConformanceError::SubjectFailed {
                    fixture: fixture.name.clone(),
                    exit,
                    stderr_tail: tail_lines(&captured.stderr, STDERR_TAIL_LINES),
                });
            }
        };

        Ok(RunRecord {
            fixture: fixture.name.clone(),
            outcome,
            duration: captured.duration,
            log_path: captured.log_path,
        })
    }
}

/// Empty `actual-reports/` so a subject that writes nothing cannot pass on
/// stale output from an earlier run.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be removed or recreated.
pub fn reset_actual_dir(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => return Err(err.into()),
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigLayer, HarnessConfig};
    use crate::fixture::FixtureManifest;
    use tempfile::TempDir;

    #[test]
    fn classify_zero_passes() {
        assert_eq!(classify_exit(Some(0), "", &[1], None), ExitClass::Passed);
    }

    #[test]
    fn classify_tolerated_code() {
        assert_eq!(
            classify_exit(Some(1), "1 scenario failed", &[1], None),
            ExitClass::ExpectedFailure(1)
        );
    }

    #[test]
    fn classify_untolerated_code() {
        assert_eq!(
            classify_exit(Some(2), "", &[1], None),
            ExitClass::Unexpected("exit code 2".to_string())
        );
    }

    #[test]
    fn classify_signal_is_unexpected() {
        assert!(matches!(
            classify_exit(None, "", &[1], None),
            ExitClass::Unexpected(_)
        ));
    }

    #[test]
    fn classify_requires_pattern_when_configured() {
        let re = Regex::new(r"Command failed: .*cucumber").expect("regex");
        assert_eq!(
            classify_exit(Some(1), "Command failed: npx cucumber-js", &[1], Some(&re)),
            ExitClass::ExpectedFailure(1)
        );
        assert!(matches!(
            classify_exit(Some(1), "TypeError: boom", &[1], Some(&re)),
            ExitClass::Unexpected(_)
        ));
    }

    #[test]
    fn tail_keeps_last_lines() {
        assert_eq!(tail_lines("a\nb\nc\nd", 2), "c\nd");
        assert_eq!(tail_lines("a", 5), "a");
    }

    #[test]
    fn reset_actual_dir_clears_stale_reports() {
        let temp = TempDir::new().expect("tempdir");
        let dir = temp.path().join("actual-reports");
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join("json-report.json"), "{}").expect("write");

        reset_actual_dir(&dir).expect("reset");
        assert!(dir.is_dir());
        assert!(!dir.join("json-report.json").exists());
    }

    #[test]
    fn from_config_requires_command() {
        let config = HarnessConfig::resolve(Path::new("/tmp"), &ConfigLayer::default())
            .expect("resolve");
        let err = CommandRunner::from_config(&config).unwrap_err();
        assert!(matches!(err, ConformanceError::Config(_)));
    }

    #[test]
    fn spawn_failure_is_reported() {
        let temp = TempDir::new().expect("tempdir");
        fs::create_dir_all(temp.path().join("features/minimal")).expect("mkdir");
        let layer = ConfigLayer {
            command: Some(vec!["definitely-not-a-real-binary-4f2a".to_string()]),
            ..ConfigLayer::default()
        };
        let config = HarnessConfig::resolve(temp.path(), &layer).expect("resolve");
        let runner = CommandRunner::from_config(&config).expect("runner").without_logs();
        let fixture = Fixture {
            name: "minimal".to_string(),
            dir: temp.path().join("features/minimal"),
            manifest: FixtureManifest::default(),
        };
        let err = runner.run(&fixture).unwrap_err();
        assert!(matches!(err, ConformanceError::SpawnFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn selector_is_bound_per_invocation() {
        let temp = TempDir::new().expect("tempdir");
        let fixture_dir = temp.path().join("features/skipped");
        fs::create_dir_all(&fixture_dir).expect("mkdir");
        let layer = ConfigLayer {
            command: Some(vec![
                "sh".to_string(),
                "-c".to_string(),
                "printf %s \"$CONFORMANCE_FIXTURE\" > \"features/$CONFORMANCE_FIXTURE/actual-reports/selected.txt\""
                    .to_string(),
            ]),
            ..ConfigLayer::default()
        };
        let config = HarnessConfig::resolve(temp.path(), &layer).expect("resolve");
        let runner = CommandRunner::from_config(&config).expect("runner");
        let fixture = Fixture {
            name: "skipped".to_string(),
            dir: fixture_dir.clone(),
            manifest: FixtureManifest::default(),
        };

        let record = runner.run(&fixture).expect("run");
        assert_eq!(record.outcome, RunOutcome::Passed);
        let selected =
            fs::read_to_string(fixture_dir.join("actual-reports/selected.txt")).expect("read");
        assert_eq!(selected, "skipped");
        assert!(record.log_path.expect("log path").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn manifest_exit_codes_replace_defaults() {
        let temp = TempDir::new().expect("tempdir");
        let fixture_dir = temp.path().join("features/undefined");
        fs::create_dir_all(&fixture_dir).expect("mkdir");
        let layer = ConfigLayer {
            command: Some(vec!["sh".to_string(), "-c".to_string(), "exit 3".to_string()]),
            ..ConfigLayer::default()
        };
        let config = HarnessConfig::resolve(temp.path(), &layer).expect("resolve");
        let runner = CommandRunner::from_config(&config).expect("runner").without_logs();

        let mut fixture = Fixture {
            name: "undefined".to_string(),
            dir: fixture_dir,
            manifest: FixtureManifest::default(),
        };
        assert!(matches!(
            runner.run(&fixture).unwrap_err(),
            ConformanceError::SubjectFailed { .. }
        ));

        fixture.manifest.tolerated_exit_codes = Some(vec![3]);
        let record = runner.run(&fixture).expect("tolerated");
        assert_eq!(record.outcome, RunOutcome::ExpectedFailure { exit_code: 3 });
    }
}
