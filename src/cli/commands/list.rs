//! List command implementation.

use super::{CommandContext, print_json};
use crate::error::Result;
use crate::fixture::{Fixture, select_fixtures};
use crate::format::{FixtureEntry, format_listing};

/// Execute the list command.
///
/// # Errors
///
/// Returns an error if the fixture root is missing, an overridden fixture
/// does not exist, or a manifest is invalid.
pub fn execute(ctx: &CommandContext) -> Result<()> {
    let config = ctx.load_config()?;
    let names = select_fixtures(
        &config.features_root,
        &config.exclude,
        config.fixture_override.as_deref(),
    )?;

    let mut entries = Vec::with_capacity(names.len());
    for name in &names {
        let fixture = Fixture::open(&config.features_root, name)?;
        entries.push(FixtureEntry::from_fixture(&fixture));
    }

    if ctx.json {
        print_json(&entries)?;
    } else if !ctx.quiet {
        println!("{}", format_listing(&entries));
    }
    Ok(())
}
