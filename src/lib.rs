// src/lib.rs
//! notion2slack library: walks a Notion workspace and relays page reports
//! to Slack.
//!
//! # Public API
//!
//! The library exposes modules organized by concern:
//! - **Walking**: `walker::TreeWalker` over any `api::NotionRepository`
//! - **Facts and filters**: `facts::UserDirectory`, `filter::PageFilter`
//! - **Delivery**: `slack::ChatRelay`, `slack::FileUploader`, `output`
//! - **Reports**: `pipeline` runs each report end to end

pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod error_recovery;
pub mod facts;
pub mod filter;
pub mod formatting;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod posted_cache;
pub mod reports;
pub mod slack;
pub mod types;
pub mod walker;

// --- Error Handling ---
pub use crate::error::{AppError, NotionErrorCode};
pub use crate::error_recovery::{Backoff, RetryPolicy};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{CommandLineInput, RelayConfig};

// --- Domain Model ---
pub use crate::model::{Node, NodeKind, Page, PageSummary, Parent, UserRef};
pub use crate::types::{ApiKey, NotionId, SlackToken, UserId, ValidatedUrl};

// --- Notion Access ---
pub use crate::api::{InMemoryNotion, NotionHttpClient, NotionRepository, Paginated};

// --- Walking ---
pub use crate::walker::{AccessGap, GapReason, Separator, TreeWalker, WalkOptions, WalkReport};

// --- Filtering and Delivery ---
pub use crate::filter::{PageFilter, VisibilityPolicy};
pub use crate::posted_cache::PostedCache;
pub use crate::slack::{ChatMessage, ChatRelay, FileUploader, RecordingRelay, WebhookRelay};
