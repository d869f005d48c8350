// src/walker/report.rs
use crate::model::Page;
use crate::types::NotionId;
use indexmap::IndexMap;
use std::fmt;

/// Why part of the tree could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GapReason {
    /// A synced block points at an original the integration cannot see, or
    /// whose children it cannot list.
    SyncedOriginalInaccessible,
    /// The node claimed children but the listing came back empty.
    EmptyChildren,
    /// Listing children or querying rows failed.
    FetchFailed(String),
    /// Retrieving a child page failed.
    PageUnavailable(String),
}

impl fmt::Display for GapReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GapReason::SyncedOriginalInaccessible => {
                write!(f, "synced original is not shared with the integration")
            }
            GapReason::EmptyChildren => write!(f, "reported children but none were returned"),
            GapReason::FetchFailed(msg) => write!(f, "fetch failed: {}", msg),
            GapReason::PageUnavailable(msg) => write!(f, "page unavailable: {}", msg),
        }
    }
}

/// A subtree the walk had to skip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGap {
    pub node_id: NotionId,
    pub reason: GapReason,
}

impl fmt::Display for AccessGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.node_id, self.reason)
    }
}

/// Everything a walk found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalkReport {
    /// Discovered pages in depth-first discovery order, each exactly once.
    pub pages: IndexMap<NotionId, Page>,
    /// Leaf text in depth-first order, joined with the configured separator.
    pub text: String,
    /// `text` split by the starting node's top-level children.
    pub branch_texts: Vec<String>,
    pub gaps: Vec<AccessGap>,
    pub nodes_visited: usize,
    /// Set when the depth guard stopped an expansion.
    pub depth_limited: bool,
}

impl WalkReport {
    pub fn into_pages(self) -> Vec<Page> {
        self.pages.into_values().collect()
    }
}
