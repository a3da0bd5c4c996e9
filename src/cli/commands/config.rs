//! Config command implementation.
//!
//! Prints the merged configuration (defaults < `conformance.yaml` <
//! `CONFORMANCE_*` environment < CLI flags) with resolved paths.

use super::{CommandContext, print_json};
use crate::config::{CONFIG_FILE, HarnessConfig};
use crate::error::Result;
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

#[derive(Serialize)]
struct ConfigOutput<'a> {
    config_file: PathBuf,
    config_file_present: bool,
    #[serde(flatten)]
    config: &'a HarnessConfig,
}

/// Execute the config command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or serialized.
pub fn execute(ctx: &CommandContext) -> Result<()> {
    let config = ctx.load_config()?;
    let config_file = ctx.root.join(CONFIG_FILE);
    let output = ConfigOutput {
        config_file_present: config_file.is_file(),
        config_file,
        config: &config,
    };
    debug!(present = output.config_file_present, "config file");

    if ctx.json {
        return print_json(&output);
    }

    let presence = if output.config_file_present {
        ""
    } else {
        " (not present, using defaults)"
    };
    println!("# {}{presence}", output.config_file.display());
    print!("{}", serde_yaml::to_string(&config)?);
    Ok(())
}
