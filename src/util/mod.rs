//! Shared utilities.
//!
//! - Progress indicators for the fixture loop
//! - Duration formatting for summaries

pub mod progress;

/// Human-readable duration from milliseconds: `850ms`, `2.4s`, `1m05s`.
#[must_use]
pub fn format_duration_ms(ms: u128) -> String {
    if ms < 1_000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        let tenths = ms / 100;
        format!("{}.{}s", tenths / 10, tenths % 10)
    } else {
        let secs = ms / 1_000;
        format!("{}m{:02}s", secs / 60, secs % 60)
    }
}
