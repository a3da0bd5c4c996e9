//! Subcommand implementations.
//!
//! Each command returns the process exit code on success paths that still
//! need a nonzero status (a failing run, differing reports); hard errors go
//! through `ConformanceError` and `main`'s error handler.

pub mod compare;
pub mod completions;
pub mod config;
pub mod list;
pub mod regenerate;
pub mod run;
pub mod version;

use crate::config::{CliOverrides, HarnessConfig, load_config};
use crate::error::Result;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

/// Global options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    pub root: PathBuf,
    pub json: bool,
    pub quiet: bool,
    pub no_color: bool,
    pub overrides: CliOverrides,
}

impl CommandContext {
    /// Resolve configuration for this invocation.
    ///
    /// # Errors
    ///
    /// See [`load_config`].
    pub fn load_config(&self) -> Result<HarnessConfig> {
        load_config(&self.root, &self.overrides)
    }

    /// Color only for a terminal stdout, unless disabled.
    #[must_use]
    pub fn use_color(&self) -> bool {
        !self.no_color && io::stdout().is_terminal()
    }
}

/// Print `value` as pretty JSON on stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
