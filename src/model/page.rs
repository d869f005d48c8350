// src/model/page.rs
//! Pages and the facts extracted from them.

use crate::constants::UNTITLED;
use crate::types::{NotionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user as referenced from a page. Notion often omits the name for
/// integrations without the user-information capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: UserId,
    #[serde(default)]
    pub name: Option<String>,
}

impl UserRef {
    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            name: Some(name.into()),
        }
    }

    pub fn anonymous(id: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            name: None,
        }
    }

    /// The name, if Notion sent a non-blank one.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

/// Where an object lives in the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Parent {
    Page { page_id: NotionId },
    Database { database_id: NotionId },
    Block { block_id: NotionId },
    Workspace,
    Unknown,
}

impl Parent {
    pub fn page_id(&self) -> Option<&NotionId> {
        match self {
            Parent::Page { page_id } => Some(page_id),
            _ => None,
        }
    }
}

/// Author information declared on the page itself, in precedence order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorHints {
    /// First person of the first non-empty people-typed property.
    pub person: Option<UserRef>,
    /// Text of a rich-text property whose name mentions "author".
    pub text: Option<String>,
}

/// A Notion page, reduced to what the reports need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: NotionId,
    pub title: String,
    pub url: String,
    pub public_url: Option<String>,
    pub created_time: DateTime<Utc>,
    pub last_edited_time: DateTime<Utc>,
    pub created_by: Option<UserRef>,
    pub last_edited_by: Option<UserRef>,
    pub author_hints: AuthorHints,
    /// Label of a status property, or of a select property named like "status".
    pub status: Option<String>,
    pub archived: bool,
    pub parent: Parent,
}

impl Page {
    /// A minimal page; the remaining fields are filled with the builder methods.
    pub fn new(id: NotionId, title: impl Into<String>, created_time: DateTime<Utc>) -> Self {
        let title = title.into();
        let url = id.web_url();
        Self {
            id,
            title: if title.trim().is_empty() {
                UNTITLED.to_string()
            } else {
                title
            },
            url,
            public_url: None,
            created_time,
            last_edited_time: created_time,
            created_by: None,
            last_edited_by: None,
            author_hints: AuthorHints::default(),
            status: None,
            archived: false,
            parent: Parent::Unknown,
        }
    }

    pub fn with_public_url(mut self, url: impl Into<String>) -> Self {
        self.public_url = Some(url.into());
        self
    }

    pub fn with_last_edited(mut self, at: DateTime<Utc>) -> Self {
        self.last_edited_time = at;
        self
    }

    pub fn with_created_by(mut self, user: UserRef) -> Self {
        self.created_by = Some(user);
        self
    }

    pub fn with_last_edited_by(mut self, user: UserRef) -> Self {
        self.last_edited_by = Some(user);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_parent(mut self, parent: Parent) -> Self {
        self.parent = parent;
        self
    }

    pub fn has_public_url(&self) -> bool {
        self.public_url.as_deref().is_some_and(|u| !u.is_empty())
    }

    /// Whole days since creation, never negative.
    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_time).num_days().max(0)
    }

    /// Whole days since the last edit, never negative.
    pub fn days_since_edit(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_edited_time).num_days().max(0)
    }
}

/// A page together with resolved author and last-editor names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    pub page: Page,
    pub author: String,
    pub last_editor: String,
}

impl PageSummary {
    pub fn id(&self) -> &NotionId {
        &self.page.id
    }

    pub fn title(&self) -> &str {
        &self.page.title
    }

    pub fn url(&self) -> &str {
        &self.page.url
    }
}
