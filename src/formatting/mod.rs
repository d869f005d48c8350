// src/formatting/mod.rs
//! Renders page summaries into Slack messages and markdown reports.

mod messages;
mod summary;
mod templates;

pub use messages::{announcement, digest, error_notice, stale_count};
pub use summary::{stale_summary, StaleSummary};
pub use templates::TemplateSet;

/// Escapes the three characters Slack's mrkdwn treats as control characters.
pub fn escape_mrkdwn(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Makes text safe inside a markdown table cell.
pub fn escape_table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
