use clap::Parser;
use report_conformance::cli::commands::{self, CommandContext};
use report_conformance::cli::{Cli, Commands};
use report_conformance::config::CliOverrides;
use report_conformance::logging::init_logging;
use report_conformance::{ConformanceError, StructuredError};
use std::io::{self, IsTerminal};
use std::path::PathBuf;

fn main() {
    let cli = Cli::parse();

    // --json also switches logs to JSON; otherwise RCONF_LOG_FORMAT decides.
    if let Err(e) = init_logging(cli.verbose, cli.quiet, cli.json.then_some(true)) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let ctx = match build_context(&cli) {
        Ok(ctx) => ctx,
        Err(e) => handle_error(&e, cli.json),
    };

    let result = match &cli.command {
        Commands::Run(args) => commands::run::execute(args, &ctx),
        Commands::List => commands::list::execute(&ctx).map(|()| 0),
        Commands::Compare(args) => commands::compare::execute(args, &ctx),
        Commands::Regenerate(args) => commands::regenerate::execute(args, &ctx).map(|()| 0),
        Commands::Config => commands::config::execute(&ctx).map(|()| 0),
        Commands::Completions(args) => commands::completions::execute(args).map(|()| 0),
        Commands::Version => commands::version::execute(cli.json).map(|()| 0),
    };

    match result {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => handle_error(&e, cli.json),
    }
}

/// Handle errors with structured output support.
///
/// When --json is set or stdout is not a TTY, outputs structured JSON to stderr.
/// Otherwise, outputs human-readable error with optional color.
fn handle_error(err: &ConformanceError, json_mode: bool) -> ! {
    let structured = StructuredError::from_error(err);
    let exit_code = structured.code.exit_code();

    let use_json = json_mode || !io::stdout().is_terminal();

    if use_json {
        let json = structured.to_json();
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
        );
    } else {
        let use_color = io::stderr().is_terminal();
        eprintln!("{}", structured.to_human(use_color));
    }

    std::process::exit(exit_code);
}

fn build_context(cli: &Cli) -> Result<CommandContext, ConformanceError> {
    let root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    if !root.is_dir() {
        return Err(ConformanceError::Config(format!(
            "harness root '{}' is not a directory",
            root.display()
        )));
    }
    Ok(CommandContext {
        root,
        json: cli.json,
        quiet: cli.quiet,
        no_color: cli.no_color,
        overrides: build_cli_overrides(cli),
    })
}

fn build_cli_overrides(cli: &Cli) -> CliOverrides {
    CliOverrides {
        features_root: cli.features_root.clone(),
        fixture: None,
        log_dir: cli.log_dir.clone(),
    }
}
