//! Regenerate command implementation.

use super::{CommandContext, print_json};
use crate::cli::RegenerateArgs;
use crate::error::Result;
use crate::fixture::Fixture;
use crate::format::RegenerateOutput;
use crate::oracle;

/// Execute the regenerate command.
///
/// # Errors
///
/// Returns an error if the fixture does not exist, no oracle is configured,
/// or the oracle fails to write both golden files.
pub fn execute(args: &RegenerateArgs, ctx: &CommandContext) -> Result<()> {
    let config = ctx.load_config()?;
    let fixture = Fixture::open(&config.features_root, &args.fixture)?;
    let output = RegenerateOutput::from(oracle::regenerate(&config, &fixture)?);

    if ctx.json {
        print_json(&output)?;
    } else if !ctx.quiet {
        println!("Regenerated golden files for '{}':", output.fixture);
        for path in &output.written {
            println!("  {}", path.display());
        }
    }
    Ok(())
}
