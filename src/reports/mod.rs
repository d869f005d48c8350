// src/reports/mod.rs
//! File reports: CSV tables and the language composition behind one of them.

mod csv_reports;
mod language;

pub use csv_reports::{digest_csv, language_csv, sort_oldest_first, stale_csv};
pub use language::{sort_rows, LanguageRow, LanguageShare, WordCounts};
