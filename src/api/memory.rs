// src/api/memory.rs
//! An in-memory workspace implementing [`NotionRepository`].
//!
//! Listings are served in pages of a configurable size so pagination paths
//! are exercised, and every call is recorded in order.

use super::{NotionRepository, Paginated};
use crate::error::{AppError, NotionErrorCode};
use crate::model::{Node, Page, UserRef};
use crate::types::{NotionId, UserId};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// A recorded repository call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListChildren(NotionId, Option<String>),
    RetrieveBlock(NotionId),
    RetrievePage(NotionId),
    QueryDatabase(NotionId, Option<String>),
    RetrieveUser(UserId),
    Search(Option<String>),
}

#[derive(Debug)]
pub struct InMemoryNotion {
    children: HashMap<NotionId, Vec<Node>>,
    blocks: HashMap<NotionId, Node>,
    pages: HashMap<NotionId, Page>,
    rows: HashMap<NotionId, Vec<Page>>,
    users: HashMap<UserId, UserRef>,
    denied: HashSet<NotionId>,
    unlisted: HashSet<NotionId>,
    page_size: usize,
    calls: Mutex<Vec<Call>>,
}

impl Default for InMemoryNotion {
    fn default() -> Self {
        Self {
            children: HashMap::new(),
            blocks: HashMap::new(),
            pages: HashMap::new(),
            rows: HashMap::new(),
            users: HashMap::new(),
            denied: HashSet::new(),
            unlisted: HashSet::new(),
            page_size: super::page_size() as usize,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl InMemoryNotion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Registers the ordered children of `parent`. Each child is also
    /// retrievable as a block.
    pub fn with_children(mut self, parent: &NotionId, nodes: Vec<Node>) -> Self {
        for node in &nodes {
            self.blocks.insert(node.id.clone(), node.clone());
        }
        self.children.insert(parent.clone(), nodes);
        self
    }

    pub fn with_block(mut self, node: Node) -> Self {
        self.blocks.insert(node.id.clone(), node);
        self
    }

    pub fn with_page(mut self, page: Page) -> Self {
        self.pages.insert(page.id.clone(), page);
        self
    }

    /// Registers database rows; each row is also retrievable as a page.
    pub fn with_rows(mut self, database: &NotionId, rows: Vec<Page>) -> Self {
        for row in &rows {
            self.pages.insert(row.id.clone(), row.clone());
        }
        self.rows.insert(database.clone(), rows);
        self
    }

    pub fn with_user(mut self, user: UserRef) -> Self {
        self.users.insert(user.id.clone(), user);
        self
    }

    /// Every request touching `id` fails as if the integration lacked access.
    pub fn deny(mut self, id: &NotionId) -> Self {
        self.denied.insert(id.clone());
        self
    }

    /// Only listing the children of `id` fails; the block itself stays
    /// retrievable.
    pub fn deny_listing(mut self, id: &NotionId) -> Self {
        self.unlisted.insert(id.clone());
        self
    }

    /// Calls made so far, oldest first.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: Call) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn check_access(&self, id: &NotionId) -> Result<(), AppError> {
        if self.denied.contains(id) {
            Err(not_found(id.as_str()))
        } else {
            Ok(())
        }
    }

    fn slice<T: Clone>(&self, items: &[T], cursor: Option<&str>) -> Result<Paginated<T>, AppError> {
        let start = match cursor {
            Some(c) => c
                .parse::<usize>()
                .map_err(|_| AppError::MalformedResponse(format!("invalid cursor '{}'", c)))?,
            None => 0,
        };
        let end = (start + self.page_size).min(items.len());
        let results = items.get(start..end).unwrap_or_default().to_vec();
        Ok(if end < items.len() {
            Paginated::more(results, end.to_string())
        } else {
            Paginated::last(results)
        })
    }
}

fn not_found(what: &str) -> AppError {
    AppError::NotionService {
        code: NotionErrorCode::ObjectNotFound,
        message: format!("Could not find {}", what),
        status: 404,
        retry_after: None,
    }
}

#[async_trait::async_trait]
impl NotionRepository for InMemoryNotion {
    async fn list_children(
        &self,
        id: &NotionId,
        cursor: Option<String>,
    ) -> Result<Paginated<Node>, AppError> {
        self.record(Call::ListChildren(id.clone(), cursor.clone()));
        self.check_access(id)?;
        if self.unlisted.contains(id) {
            return Err(not_found(id.as_str()));
        }
        let nodes = self.children.get(id).map(Vec::as_slice).unwrap_or_default();
        self.slice(nodes, cursor.as_deref())
    }

    async fn retrieve_block(&self, id: &NotionId) -> Result<Node, AppError> {
        self.record(Call::RetrieveBlock(id.clone()));
        self.check_access(id)?;
        self.blocks
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(id.as_str()))
    }

    async fn retrieve_page(&self, id: &NotionId) -> Result<Page, AppError> {
        self.record(Call::RetrievePage(id.clone()));
        self.check_access(id)?;
        self.pages
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(id.as_str()))
    }

    async fn query_database(
        &self,
        id: &NotionId,
        cursor: Option<String>,
    ) -> Result<Paginated<Page>, AppError> {
        self.record(Call::QueryDatabase(id.clone(), cursor.clone()));
        self.check_access(id)?;
        let rows = self.rows.get(id).ok_or_else(|| not_found(id.as_str()))?;
        self.slice(rows, cursor.as_deref())
    }

    async fn retrieve_user(&self, id: &UserId) -> Result<UserRef, AppError> {
        self.record(Call::RetrieveUser(id.clone()));
        self.users
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(id.as_str()))
    }

    async fn search_pages(&self, cursor: Option<String>) -> Result<Paginated<Page>, AppError> {
        self.record(Call::Search(cursor.clone()));
        let mut pages: Vec<Page> = self.pages.values().cloned().collect();
        pages.sort_by(|a, b| a.id.cmp(&b.id));
        self.slice(&pages, cursor.as_deref())
    }
}
