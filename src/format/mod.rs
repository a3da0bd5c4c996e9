//! Output formatting for `rconf`.
//!
//! Human-readable text goes to stdout by default. With `--json` the same
//! data is printed as one JSON document and diagnostics stay on stderr.
//!
//! # Output Types
//!
//! - [`RunSummary`](crate::assertions::RunSummary) - result of `run`
//! - [`FixtureEntry`] - one row of `list`
//! - [`CompareOutput`] - result of `compare`
//! - [`RegenerateOutput`] - result of `regenerate`

mod output;
mod text;

pub use output::{CompareOutput, FixtureEntry, RegenerateOutput};
pub use text::{format_compare, format_fixture_line, format_listing, format_summary};
