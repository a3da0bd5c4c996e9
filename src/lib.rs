//! Conformance harness for BDD runner reports.
//!
//! Runs each fixture directory under a features root through the plugin
//! under test, then diffs the JSON summary report and the ndjson message
//! stream it wrote against golden files, with field masking for values that
//! legitimately change between runs (run ids, timestamps).
//!
//! The binary is `rconf`; everything it does is available here.

pub mod assertions;
pub mod cli;
pub mod compare;
pub mod config;
pub mod error;
pub mod fixture;
pub mod format;
pub mod logging;
pub mod mask;
pub mod oracle;
pub mod report;
pub mod runner;
pub mod util;

pub use error::{ConformanceError, ErrorCode, Result, StructuredError};
