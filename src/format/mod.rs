//! Output formatting for `lunch_and_learn`.
//!
//! Rendering is a pure function over the fetched issues:
//! - `table` - fixed-width columns with a totals footer
//! - `json` - pretty-printed array with canonical priority names
//! - `simple` - one `<icon> <code>: <short description>` line per issue
//!
//! The [`csv`] module reads the `issues.csv` reseed snapshot.

pub mod csv;
mod text;

use crate::error::Result;
use crate::model::Issue;
use serde::{Deserialize, Serialize};

pub use text::{
    EMPTY_MESSAGE, format_issue_line, format_simple, format_table, pad, priority_icon, truncate,
};

/// Listing format selected with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Simple,
}

/// Render `issues` in the requested format.
///
/// Empty input renders as [`EMPTY_MESSAGE`] except in JSON, which prints `[]`.
///
/// # Errors
///
/// Returns a JSON error if serialization fails.
pub fn render_issues(issues: &[Issue], format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(issues)?,
        _ if issues.is_empty() => EMPTY_MESSAGE.to_string(),
        OutputFormat::Table => format_table(issues),
        OutputFormat::Simple => format_simple(issues),
    })
}
