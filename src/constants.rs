// src/constants.rs
//! Domain constants that define the operational boundaries of the system.
//!
//! Each constant is named for the domain concept it constrains, not its
//! technical role. Reading these constants should tell you the story
//! of how a run operates: how deep it walks, how fast it asks, how old a
//! page must be before anyone hears about it.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Notion API boundaries
// ---------------------------------------------------------------------------

/// Base URL of the Notion REST API.
pub const NOTION_API_BASE: &str = "https://api.notion.com/v1";

/// The `Notion-Version` header every request is pinned to.
pub const NOTION_API_VERSION: &str = "2022-06-28";

/// How many objects the Notion API returns per page of results.
///
/// The Notion API maximum is 100.
pub const NOTION_API_PAGE_SIZE: usize = 100;

/// Maximum nesting depth the tree walker will expand.
///
/// 50 levels is far deeper than any real Notion workspace.
pub const NOTION_MAX_FETCH_DEPTH: usize = 50;

/// Pause before each Notion request. Notion allows ~3 requests per second.
pub const NOTION_REQUEST_INTERVAL: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Report thresholds
// ---------------------------------------------------------------------------

/// A page must be at least this old before it is announced as new.
pub const NOVELTY_MIN_AGE_DAYS: i64 = 7;

/// Creation window for the digest report.
pub const DIGEST_MIN_AGE_DAYS: i64 = 7;
pub const DIGEST_MAX_AGE_DAYS: i64 = 21;

/// A page untouched for this many months is considered stale.
pub const STALE_DEFAULT_MONTHS: i64 = 12;

/// `--months N` is converted with 30-day months.
pub const DAYS_PER_MONTH: i64 = 30;

/// How many stale pages the markdown summary lists.
pub const SUMMARY_TOP_N: usize = 10;

// ---------------------------------------------------------------------------
// Slack
// ---------------------------------------------------------------------------

/// Base URL of the Slack Web API.
pub const SLACK_API_BASE: &str = "https://slack.com/api";

/// Pause between consecutive announcement posts.
pub const SLACK_POST_INTERVAL: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// Fallback labels
// ---------------------------------------------------------------------------

pub const UNTITLED: &str = "Untitled";
pub const UNKNOWN_USER: &str = "Unknown";

/// Default location of the posted-page cache.
pub const DEFAULT_POSTED_CACHE_PATH: &str = "posted_pages.json";

/// Maximum characters shown when previewing error response bodies.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 200;
