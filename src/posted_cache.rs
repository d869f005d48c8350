// src/posted_cache.rs
//! The record of pages already announced.
//!
//! Stored as `{ "posted_pages": [id, ...] }`. Loaded once at the start of a
//! run and rewritten once at the end.

use crate::error::AppError;
use crate::output::write_atomic;
use crate::types::NotionId;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    #[serde(default)]
    posted_pages: Vec<NotionId>,
}

/// Ordered, duplicate-free set of posted page ids bound to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedCache {
    path: PathBuf,
    ids: IndexSet<NotionId>,
}

impl PostedCache {
    /// An empty cache that will be written to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ids: IndexSet::new(),
        }
    }

    /// Reads the cache. A missing file is an empty cache; a corrupt one is an
    /// error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        if !path.exists() {
            log::info!("No posted cache at {}, starting empty", path.display());
            return Ok(Self::empty(path));
        }

        let content = fs::read_to_string(&path)?;
        let file: CacheFile =
            serde_json::from_str(&content).map_err(|source| AppError::JsonParseError {
                path: path.clone(),
                source,
            })?;
        let ids: IndexSet<NotionId> = file.posted_pages.into_iter().collect();
        log::debug!("Loaded {} posted ids from {}", ids.len(), path.display());
        Ok(Self { path, ids })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, id: &NotionId) -> bool {
        self.ids.contains(id)
    }

    /// Returns false when the id was already present.
    pub fn insert(&mut self, id: NotionId) -> bool {
        self.ids.insert(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &NotionId> {
        self.ids.iter()
    }

    /// Rewrites the whole file.
    pub fn save(&self) -> Result<(), AppError> {
        let file = CacheFile {
            posted_pages: self.ids.iter().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        write_atomic(&self.path, json.as_bytes())?;
        log::info!("Saved {} posted ids to {}", self.ids.len(), self.path.display());
        Ok(())
    }
}
