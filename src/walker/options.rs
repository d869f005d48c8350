// src/walker/options.rs
use crate::constants::NOTION_MAX_FETCH_DEPTH;
use std::time::Duration;

/// How collected text fragments are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Separator {
    #[default]
    Space,
    Newline,
}

impl Separator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Separator::Space => " ",
            Separator::Newline => "\n",
        }
    }
}

/// What a walk follows and collects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkOptions {
    /// Resolve child pages and database rows and descend into them. When
    /// false, both are boundaries and only the starting page's blocks are read.
    pub follow_pages: bool,
    /// Accumulate the plain text of leaf blocks.
    pub collect_text: bool,
    pub separator: Separator,
    /// Nodes deeper than this are not expanded.
    pub max_depth: usize,
    /// Wall-clock budget for the whole walk.
    pub deadline: Option<Duration>,
    /// Retrieve the starting id as a page and report it first.
    pub include_root: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            follow_pages: true,
            collect_text: false,
            separator: Separator::Space,
            max_depth: NOTION_MAX_FETCH_DEPTH,
            deadline: None,
            include_root: false,
        }
    }
}

impl WalkOptions {
    /// Page discovery across the whole tree.
    pub fn pages() -> Self {
        Self::default()
    }

    /// Text of one page, stopping at sub-pages and databases.
    pub fn page_text(separator: Separator) -> Self {
        Self {
            follow_pages: false,
            collect_text: true,
            separator,
            ..Self::default()
        }
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_root(mut self) -> Self {
        self.include_root = true;
        self
    }
}
