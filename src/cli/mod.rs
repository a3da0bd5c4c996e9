//! CLI definitions and entry point.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;

/// Conformance harness for BDD runner reports (JSON + ndjson golden diffing)
#[derive(Parser, Debug)]
#[command(name = "rconf", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Harness root holding conformance.yaml (default: current directory)
    #[arg(long, global = true, env = "CONFORMANCE_ROOT")]
    pub root: Option<PathBuf>,

    /// Fixture root, relative to the harness root
    #[arg(long, global = true)]
    pub features_root: Option<PathBuf>,

    /// Directory for per-fixture run logs
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors and failures)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the fixture matrix through the subject and diff its reports
    Run(RunArgs),

    /// List the fixtures a run would select
    List,

    /// Compare two report files directly
    Compare(CompareArgs),

    /// Regenerate golden files for one fixture with the oracle
    Regenerate(RegenerateArgs),

    /// Show the merged configuration
    Config,

    /// Generate shell completions
    Completions(CompletionsArgs),

    /// Show version information
    Version,
}

/// Arguments for the run command.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Run only this fixture (overrides the selector variable and exclusions)
    #[arg(long, short = 'f')]
    pub fixture: Option<String>,

    /// Continue past failing fixtures
    #[arg(long)]
    pub keep_going: bool,

    /// Do not draw a progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments for the compare command.
#[derive(Args, Debug, Clone, Default)]
pub struct CompareArgs {
    /// Report produced by the subject
    pub actual: PathBuf,

    /// Golden report
    pub expected: PathBuf,

    /// Field path to ignore (repeatable)
    #[arg(long = "mask", value_name = "PATH")]
    pub mask: Vec<String>,

    /// Field path compared by JSON type only (repeatable)
    #[arg(long = "type-only", value_name = "PATH")]
    pub type_only: Vec<String>,

    /// Do not apply the configured message-stream mask
    #[arg(long)]
    pub no_default_mask: bool,
}

/// Arguments for the regenerate command.
#[derive(Args, Debug, Clone)]
pub struct RegenerateArgs {
    /// Fixture directory name under the fixture root
    pub fixture: String,
}

/// Arguments for the completions command.
#[derive(Args, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: ShellType,

    /// Output file (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Supported shells for completion generation.
#[derive(ValueEnum, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ShellType {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    #[value(name = "powershell")]
    #[value(alias = "pwsh")]
    /// `PowerShell`
    PowerShell,
    /// Elvish
    Elvish,
}
