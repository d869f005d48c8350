// src/facts.rs
//! Resolves who wrote and who last touched a page.
//!
//! Notion frequently sends user references without names, so the names are
//! looked up through the users endpoint and memoized for the rest of the run.

use crate::api::NotionRepository;
use crate::constants::UNKNOWN_USER;
use crate::model::{Page, PageSummary, UserRef};
use crate::types::UserId;
use std::collections::HashMap;

/// Memoized user-name lookups for one run.
pub struct UserDirectory<'a, R: NotionRepository + ?Sized> {
    repo: &'a R,
    names: HashMap<UserId, Option<String>>,
}

impl<'a, R: NotionRepository + ?Sized> UserDirectory<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self {
            repo,
            names: HashMap::new(),
        }
    }

    /// The user's name, from the reference itself or the users endpoint.
    /// Failed lookups are remembered as unknown.
    pub async fn name_of(&mut self, user: &UserRef) -> Option<String> {
        if let Some(name) = user.display_name() {
            return Some(name.to_string());
        }
        if let Some(cached) = self.names.get(&user.id) {
            return cached.clone();
        }

        let name = match self.repo.retrieve_user(&user.id).await {
            Ok(found) => found.display_name().map(str::to_string),
            Err(e) => {
                log::debug!("Could not resolve user {}: {}", user.id, e);
                None
            }
        };
        self.names.insert(user.id.clone(), name.clone());
        name
    }

    /// Author by precedence: people property, author-named text property,
    /// creator name, creator looked up by id.
    pub async fn author_of(&mut self, page: &Page) -> String {
        if let Some(name) = declared_author(page) {
            return name;
        }
        let looked_up = match &page.created_by {
            Some(creator) => self.name_of(creator).await,
            None => None,
        };
        looked_up.unwrap_or_else(|| UNKNOWN_USER.to_string())
    }

    pub async fn last_editor_of(&mut self, page: &Page) -> String {
        let looked_up = match &page.last_edited_by {
            Some(editor) => self.name_of(editor).await,
            None => None,
        };
        looked_up.unwrap_or_else(|| UNKNOWN_USER.to_string())
    }

    pub async fn summarize(&mut self, page: Page) -> PageSummary {
        let author = self.author_of(&page).await;
        let last_editor = self.last_editor_of(&page).await;
        PageSummary {
            page,
            author,
            last_editor,
        }
    }

    /// Summaries in input order.
    pub async fn summarize_all(&mut self, pages: Vec<Page>) -> Vec<PageSummary> {
        let mut summaries = Vec::with_capacity(pages.len());
        for page in pages {
            summaries.push(self.summarize(page).await);
        }
        summaries
    }
}

/// The author a page names without any lookup.
pub fn declared_author(page: &Page) -> Option<String> {
    let hints = &page.author_hints;
    hints
        .person
        .as_ref()
        .and_then(UserRef::display_name)
        .or_else(|| hints.text.as_deref().map(str::trim).filter(|t| !t.is_empty()))
        .or_else(|| page.created_by.as_ref().and_then(UserRef::display_name))
        .map(str::to_string)
}
