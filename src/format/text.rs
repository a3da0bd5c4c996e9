//! Plain text rendering for terminal output.

use super::output::{CompareOutput, FixtureEntry};
use crate::assertions::{FixtureResult, RunSummary};
use crate::compare::Diff;
use crate::runner::RunOutcome;
use crate::util::format_duration_ms;
use std::fmt::Write as _;

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

fn paint(text: &str, code: &str, color: bool) -> String {
    if color {
        format!("{code}{text}{RESET}")
    } else {
        text.to_string()
    }
}

/// One line per fixture: `PASS minimal (1.2s)`.
#[must_use]
pub fn format_fixture_line(result: &FixtureResult, color: bool) -> String {
    let badge = if result.passed {
        paint("PASS", GREEN, color)
    } else {
        paint("FAIL", RED, color)
    };
    let mut line = format!(
        "{badge} {} ({}",
        result.fixture,
        format_duration_ms(result.duration_ms)
    );
    if let Some(RunOutcome::ExpectedFailure { exit_code }) = result.run {
        let _ = write!(line, ", expected failure exit {exit_code}");
    }
    line.push(')');
    line
}

/// Full run report: fixture lines, the first failure in detail, totals.
#[must_use]
pub fn format_summary(summary: &RunSummary, color: bool) -> String {
    let mut out = String::new();
    for result in &summary.results {
        out.push_str(&format_fixture_line(result, color));
        out.push('\n');
        if let Some(err) = &result.error {
            for line in err.message.lines() {
                let _ = writeln!(out, "    {line}");
            }
            if let Some(hint) = &err.hint {
                let _ = writeln!(out, "    {}", paint(&format!("Hint: {hint}"), DIM, color));
            }
        }
    }

    let _ = write!(
        out,
        "\n{} fixture(s): {} passed, {} failed",
        summary.selected, summary.passed, summary.failed
    );
    if summary.not_run > 0 {
        let _ = write!(out, ", {} not run", summary.not_run);
    }
    let elapsed = (summary.finished_at - summary.started_at)
        .num_milliseconds()
        .max(0);
    let _ = write!(
        out,
        " in {}",
        format_duration_ms(u128::from(elapsed.unsigned_abs()))
    );
    out
}

/// `list` output, one fixture per line.
#[must_use]
pub fn format_listing(entries: &[FixtureEntry]) -> String {
    let width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for entry in entries {
        let mut line = format!("{:width$}", entry.name);
        if !entry.golden_present {
            line.push_str("  [no golden]");
        }
        if entry.invariants > 0 {
            let _ = write!(line, "  [{} invariant(s)]", entry.invariants);
        }
        if let Some(description) = &entry.description {
            let _ = write!(line, "  {description}");
        }
        let _ = writeln!(out, "{}", line.trim_end());
    }
    let _ = write!(out, "{} fixture(s)", entries.len());
    out
}

/// `compare` output.
#[must_use]
pub fn format_compare(output: &CompareOutput, diff: Option<&Diff>, color: bool) -> String {
    match diff {
        None => paint("Reports match", GREEN, color),
        Some(diff) => format!(
            "{}\n  actual:   {}\n  expected: {}\n{diff}",
            paint("Reports differ", RED, color),
            output.actual.display(),
            output.expected.display()
        ),
    }
}
