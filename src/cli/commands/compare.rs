//! Compare command implementation.

use super::{CommandContext, print_json};
use crate::cli::CompareArgs;
use crate::compare::compare_documents;
use crate::error::{ErrorCode, Result};
use crate::format::{CompareOutput, format_compare};
use crate::mask::{MaskDirective, MaskTable};
use crate::report::{self, Document, Side};
use tracing::debug;

/// Mask for a direct comparison: the configured stream mask for message
/// streams (unless disabled) plus the paths given on the command line.
#[must_use]
pub fn build_mask(args: &CompareArgs, configured: &MaskTable, expected: &Document) -> MaskTable {
    let mut mask = match expected {
        Document::Stream(_) if !args.no_default_mask => configured.clone(),
        _ => MaskTable::new(),
    };
    for path in &args.mask {
        mask.insert(path.as_str(), MaskDirective::Ignore);
    }
    for path in &args.type_only {
        mask.insert(path.as_str(), MaskDirective::TypeOnly);
    }
    mask
}

/// Execute the compare command.
///
/// Returns 0 when the reports match, or the mismatch exit code.
///
/// # Errors
///
/// Returns an error if either file is missing or malformed.
pub fn execute(args: &CompareArgs, ctx: &CommandContext) -> Result<i32> {
    let config = ctx.load_config()?;
    let actual = report::load_document(&args.actual, Side::Actual)?;
    let expected = report::load_document(&args.expected, Side::Expected)?;
    let mask = build_mask(args, &config.mask, &expected);
    debug!(entries = mask.len(), "comparing with mask");

    let diff = compare_documents(&actual, &expected, &mask)
        .err()
        .map(|d| d.with_render_limit(config.max_diff_entries));
    let output = CompareOutput::new(args.actual.clone(), args.expected.clone(), diff.as_ref());

    if ctx.json {
        print_json(&output)?;
    } else if !ctx.quiet || diff.is_some() {
        println!("{}", format_compare(&output, diff.as_ref(), ctx.use_color()));
    }

    Ok(if output.equal {
        0
    } else {
        ErrorCode::ReportMismatch.exit_code()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stream_comparison_uses_configured_mask() {
        let args = CompareArgs {
            mask: vec!["meta.runtime".to_string()],
            ..CompareArgs::default()
        };
        let mask = build_mask(&args, &MaskTable::standard(), &Document::Stream(vec![]));
        assert!(mask.directive("testRunStarted.id").is_some());
        assert_eq!(mask.directive("meta.runtime"), Some(MaskDirective::Ignore));
    }

    #[test]
    fn json_comparison_starts_empty() {
        let args = CompareArgs {
            type_only: vec!["duration".to_string()],
            ..CompareArgs::default()
        };
        let mask = build_mask(&args, &MaskTable::standard(), &Document::Json(json!({})));
        assert_eq!(mask.len(), 1);
        assert_eq!(mask.directive("duration"), Some(MaskDirective::TypeOnly));
    }

    #[test]
    fn default_mask_can_be_disabled() {
        let args = CompareArgs {
            no_default_mask: true,
            ..CompareArgs::default()
        };
        let mask = build_mask(&args, &MaskTable::standard(), &Document::Stream(vec![]));
        assert!(mask.is_empty());
    }
}
