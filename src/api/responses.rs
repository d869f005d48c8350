// src/api/responses.rs
//! Wire envelopes for Notion responses.
//!
//! Block payloads and page properties are decoded with notion-client's
//! types; the surrounding envelopes are declared here so that fields the
//! reports depend on (`public_url`, `created_by`, `parent`) are read
//! regardless of the library's struct layout.

use crate::model::{Parent, UserRef};
use crate::types::NotionId;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

pub use notion_client::objects::{
    block::Block as NotionBlock, page::PageProperty as NotionProperty,
    rich_text::RichText as NotionRichText,
};

/// A page object as returned by `pages/{id}`, database queries and search.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPage {
    pub id: NotionId,
    pub created_time: DateTime<Utc>,
    pub last_edited_time: DateTime<Utc>,
    #[serde(default)]
    pub created_by: Option<RawUser>,
    #[serde(default)]
    pub last_edited_by: Option<RawUser>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default)]
    pub parent: Option<RawParent>,
    /// Kept undecoded so that one unknown property type cannot fail the page.
    #[serde(default)]
    pub properties: IndexMap<String, Value>,
}

/// A user reference or a full user object.
#[derive(Debug, Clone, Deserialize)]
pub struct RawUser {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl From<RawUser> for UserRef {
    fn from(raw: RawUser) -> Self {
        UserRef {
            id: crate::types::UserId::new(raw.id),
            name: raw.name,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawParent {
    PageId { page_id: NotionId },
    DatabaseId { database_id: NotionId },
    BlockId { block_id: NotionId },
    Workspace,
    #[serde(other)]
    Other,
}

impl From<RawParent> for Parent {
    fn from(raw: RawParent) -> Self {
        match raw {
            RawParent::PageId { page_id } => Parent::Page { page_id },
            RawParent::DatabaseId { database_id } => Parent::Database { database_id },
            RawParent::BlockId { block_id } => Parent::Block { block_id },
            RawParent::Workspace => Parent::Workspace,
            RawParent::Other => Parent::Unknown,
        }
    }
}

/// The error body Notion sends with non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct NotionErrorBody {
    pub code: String,
    #[serde(default)]
    pub message: String,
}
