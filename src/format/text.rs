//! Plain text rendering for issue listings.
//!
//! - Priority icons (🟢 🟡 🔴)
//! - Fixed-width table with a totals footer
//! - One-line "simple" format

use crate::model::{Issue, Priority};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Priority icon characters.
pub mod icons {
    pub const LOW: &str = "🟢";
    pub const MEDIUM: &str = "🟡";
    pub const HIGH: &str = "🔴";
}

/// Column widths of the table format.
pub const CODE_WIDTH: usize = 12;
pub const PRIORITY_WIDTH: usize = 10;
pub const DESCRIPTION_WIDTH: usize = 40;
/// Descriptions are cut to this many display columns.
pub const DESCRIPTION_MAX: usize = 38;
pub const RULE_WIDTH: usize = 70;

/// Message printed in place of an empty listing.
pub const EMPTY_MESSAGE: &str = "No issues found.";

/// Return the icon for a priority.
#[must_use]
pub const fn priority_icon(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => icons::LOW,
        Priority::Medium => icons::MEDIUM,
        Priority::High => icons::HIGH,
    }
}

/// Cut `text` to at most `max_width` display columns.
///
/// Wide characters (emoji, CJK) count as two columns and are never split.
#[must_use]
pub fn truncate(text: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }

    let mut width = 0;
    let mut out = String::new();
    for c in text.chars() {
        let cw = UnicodeWidthChar::width(c).unwrap_or(0);
        if width + cw > max_width {
            break;
        }
        width += cw;
        out.push(c);
    }
    out
}

/// Left-align `text` in a field `width` display columns wide.
#[must_use]
pub fn pad(text: &str, width: usize) -> String {
    let used = UnicodeWidthStr::width(text);
    let mut out = text.to_string();
    out.extend(std::iter::repeat_n(' ', width.saturating_sub(used)));
    out
}

/// One table row, without trailing padding.
#[must_use]
pub fn format_table_row(code: &str, priority: &str, description: &str) -> String {
    format!(
        "{} {} {}",
        pad(code, CODE_WIDTH),
        pad(priority, PRIORITY_WIDTH),
        pad(description, DESCRIPTION_WIDTH)
    )
    .trim_end()
    .to_string()
}

/// Render issues as a fixed-width table.
#[must_use]
pub fn format_table(issues: &[Issue]) -> String {
    let mut out = String::from("\n");
    out.push_str(&format_table_row("Code", "Priority", "Description"));
    out.push('\n');
    out.push_str(&"-".repeat(RULE_WIDTH));
    out.push('\n');
    for issue in issues {
        let description = truncate(&issue.short_description, DESCRIPTION_MAX);
        out.push_str(&format_table_row(
            &issue.code,
            issue.priority.as_str(),
            &description,
        ));
        out.push('\n');
    }
    out.push_str(&format!("\nTotal: {} issue(s)\n", issues.len()));
    out
}

/// Format a single-line issue summary.
///
/// Format: `{icon} {code}: {short description}`
#[must_use]
pub fn format_issue_line(issue: &Issue) -> String {
    format!(
        "{} {}: {}",
        priority_icon(issue.priority),
        issue.code,
        issue.short_description
    )
}

/// Render issues one per line.
#[must_use]
pub fn format_simple(issues: &[Issue]) -> String {
    let mut out = String::new();
    for issue in issues {
        out.push_str(&format_issue_line(issue));
        out.push('\n');
    }
    out
}
