//! Run command implementation.

use super::{CommandContext, print_json};
use crate::assertions::{RunOptions, run_conformance};
use crate::cli::RunArgs;
use crate::error::Result;
use crate::format::format_summary;
use crate::runner::CommandRunner;
use crate::util::progress::should_show_progress;
use tracing::info;

/// Execute the run command.
///
/// Returns 0 when every selected fixture passed, otherwise the exit code of
/// the first failure's error category.
///
/// # Errors
///
/// Returns an error if configuration is invalid, no subject command is
/// configured, or fixtures cannot be enumerated.
pub fn execute(args: &RunArgs, ctx: &CommandContext) -> Result<i32> {
    let mut ctx = ctx.clone();
    if let Some(fixture) = &args.fixture {
        ctx.overrides.fixture = Some(fixture.clone());
    }
    let config = ctx.load_config()?;
    let runner = CommandRunner::from_config(&config)?;

    let options = RunOptions {
        keep_going: args.keep_going,
        show_progress: !args.no_progress && !ctx.json && !ctx.quiet && should_show_progress(),
    };
    let summary = run_conformance(&config, &runner, options)?;
    info!(
        passed = summary.passed,
        failed = summary.failed,
        not_run = summary.not_run,
        "run finished"
    );

    if ctx.json {
        print_json(&summary)?;
    } else if !ctx.quiet || !summary.is_success() {
        println!("{}", format_summary(&summary, ctx.use_color()));
    }

    Ok(summary.exit_code())
}
