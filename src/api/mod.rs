// src/api/mod.rs
//! Notion API interaction: reading a workspace.
//!
//! Business logic depends on [`NotionRepository`], never on HTTP details.
//! `client` talks to the real API; `memory` serves a fixed tree to tests.

pub mod client;
pub mod memory;
mod pagination;
pub mod parser;
mod responses;

pub use client::NotionHttpClient;
pub use memory::InMemoryNotion;
pub use pagination::{collect_all, page_size, Paginated};

use crate::error::AppError;
use crate::model::{Node, Page, UserRef};
use crate::types::{NotionId, UserId};

/// Read access to a Notion workspace.
///
/// Listing operations return one page of results per call; the provided
/// methods drain them.
#[async_trait::async_trait]
pub trait NotionRepository: Send + Sync {
    async fn list_children(
        &self,
        id: &NotionId,
        cursor: Option<String>,
    ) -> Result<Paginated<Node>, AppError>;
    async fn retrieve_block(&self, id: &NotionId) -> Result<Node, AppError>;
    async fn retrieve_page(&self, id: &NotionId) -> Result<Page, AppError>;
    async fn query_database(
        &self,
        id: &NotionId,
        cursor: Option<String>,
    ) -> Result<Paginated<Page>, AppError>;
    async fn retrieve_user(&self, id: &UserId) -> Result<UserRef, AppError>;
    async fn search_pages(&self, cursor: Option<String>) -> Result<Paginated<Page>, AppError>;

    /// Every child of a block or page, in order.
    async fn children_of(&self, id: &NotionId) -> Result<Vec<Node>, AppError> {
        collect_all(move |cursor| self.list_children(id, cursor), None).await
    }

    /// Every row of a database, in query order.
    async fn database_rows(&self, id: &NotionId) -> Result<Vec<Page>, AppError> {
        collect_all(move |cursor| self.query_database(id, cursor), None).await
    }

    /// Every page shared with the integration.
    async fn all_pages(&self) -> Result<Vec<Page>, AppError> {
        collect_all(move |cursor| self.search_pages(cursor), None).await
    }
}
