//! Tracing subscriber setup.
//!
//! Logs go to stderr so report output on stdout stays parseable. `RUST_LOG`
//! takes precedence over `-v`/`-q`.

use anyhow::Result;
use std::io;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Default filter for a verbosity level.
#[must_use]
pub const fn level_for(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Install the global subscriber.
///
/// `json` forces the JSON formatter on or off; `None` reads
/// `RCONF_LOG_FORMAT=json`. The binary passes `Some(true)` under `--json`.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(verbose: u8, quiet: bool, json: Option<bool>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbose, quiet)));
    let json = json.unwrap_or_else(|| {
        std::env::var("RCONF_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(verbose > 1);

    if json {
        builder
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!("{e}"))?;
    } else {
        builder
            .without_time()
            .try_init()
            .map_err(|e| anyhow::anyhow!("{e}"))?;
    }
    Ok(())
}

static TEST_LOGGING: Once = Once::new();

/// Subscriber for unit tests, captured by the test harness.
pub fn init_test_logging() {
    TEST_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    });
}
