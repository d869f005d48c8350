// src/formatting/summary.rs
//! The markdown summary written for CI step summaries.

use super::{escape_table_cell, TemplateSet};
use crate::constants::SUMMARY_TOP_N;
use crate::error::AppError;
use crate::model::PageSummary;
use chrono::{DateTime, Utc};
use serde_json::json;

/// Inputs of the stale-page summary. `stale` is expected oldest first.
pub struct StaleSummary<'a> {
    pub total_scanned: usize,
    pub stale: &'a [PageSummary],
    pub months: i64,
    pub now: DateTime<Utc>,
}

pub fn stale_summary(templates: &TemplateSet, summary: &StaleSummary<'_>) -> Result<String, AppError> {
    let top: Vec<_> = summary
        .stale
        .iter()
        .take(SUMMARY_TOP_N)
        .map(|s| {
            json!({
                "title": escape_table_cell(s.title()),
                "url": s.url(),
                "last_edited": s.page.last_edited_time.format("%Y-%m-%d").to_string(),
                "days": s.page.days_since_edit(summary.now),
                "author": escape_table_cell(&s.author),
            })
        })
        .collect();

    templates.render(
        "stale_summary",
        &json!({
            "total": summary.total_scanned,
            "stale_count": summary.stale.len(),
            "months": summary.months,
            "top_n": SUMMARY_TOP_N,
            "top": top,
        }),
    )
}
