// src/reports/csv_reports.rs
//! CSV renderings of the reports. Each function returns the whole file.

use super::language::LanguageRow;
use crate::error::AppError;
use crate::model::PageSummary;
use chrono::{DateTime, Utc};

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, AppError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| AppError::MalformedResponse(e.to_string()))
}

/// Orders stale pages oldest edit first.
pub fn sort_oldest_first(pages: &mut [PageSummary]) {
    pages.sort_by_key(|s| s.page.last_edited_time);
}

/// `Title,Author,Last Editor,Last Edited,Days Since Edit,URL`, in the given order.
pub fn stale_csv(pages: &[PageSummary], now: DateTime<Utc>) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "Title",
        "Author",
        "Last Editor",
        "Last Edited",
        "Days Since Edit",
        "URL",
    ])?;
    for s in pages {
        writer.write_record([
            s.title(),
            s.author.as_str(),
            s.last_editor.as_str(),
            s.page.last_edited_time.format("%Y-%m-%d").to_string().as_str(),
            s.page.days_since_edit(now).to_string().as_str(),
            s.url(),
        ])?;
    }
    finish(writer)
}

/// `Page Title,Page URL,Author,% Russian,% English`.
pub fn language_csv(rows: &[LanguageRow]) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Page Title", "Page URL", "Author", "% Russian", "% English"])?;
    for row in rows {
        writer.write_record([
            row.title.as_str(),
            row.url.as_str(),
            row.author.as_str(),
            row.share.russian_pct.to_string().as_str(),
            row.share.english_pct.to_string().as_str(),
        ])?;
    }
    finish(writer)
}

/// `Title,Author,Created,URL`.
pub fn digest_csv(pages: &[PageSummary]) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Title", "Author", "Created", "URL"])?;
    for s in pages {
        writer.write_record([
            s.title(),
            s.author.as_str(),
            s.page.created_time.format("%Y-%m-%d").to_string().as_str(),
            s.url(),
        ])?;
    }
    finish(writer)
}
