// src/model/node.rs
//! Blocks as the tree walker sees them.

use super::Parent;
use crate::types::NotionId;
use serde::{Deserialize, Serialize};

/// The closed set of shapes the walker distinguishes.
///
/// Everything Notion can return maps onto exactly one of these; block types
/// without a textual payload become a `Leaf` with empty text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    /// A sub-page. Its id is also a page id.
    ChildPage { title: String },
    /// An inline or full-page database. Its id is also a database id.
    ChildDatabase { title: String },
    ColumnList,
    Column,
    /// `synced_from` is `Some` for an alias of another block, `None` for the original.
    SyncedBlock { synced_from: Option<NotionId> },
    Leaf { block_type: String, text: String },
}

impl NodeKind {
    /// The Notion `type` discriminant this kind came from.
    pub fn type_name(&self) -> &str {
        match self {
            NodeKind::ChildPage { .. } => "child_page",
            NodeKind::ChildDatabase { .. } => "child_database",
            NodeKind::ColumnList => "column_list",
            NodeKind::Column => "column",
            NodeKind::SyncedBlock { .. } => "synced_block",
            NodeKind::Leaf { block_type, .. } => block_type,
        }
    }
}

/// A single block in the workspace tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NotionId,
    pub has_children: bool,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Parent>,
}

impl Node {
    pub fn new(id: NotionId, kind: NodeKind) -> Self {
        Self {
            id,
            has_children: false,
            kind,
            parent: None,
        }
    }

    pub fn with_children(mut self, has_children: bool) -> Self {
        self.has_children = has_children;
        self
    }

    pub fn with_parent(mut self, parent: Parent) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn child_page(id: NotionId, title: impl Into<String>) -> Self {
        Self::new(
            id,
            NodeKind::ChildPage {
                title: title.into(),
            },
        )
        .with_children(true)
    }

    pub fn child_database(id: NotionId, title: impl Into<String>) -> Self {
        Self::new(
            id,
            NodeKind::ChildDatabase {
                title: title.into(),
            },
        )
    }

    pub fn leaf(id: NotionId, block_type: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(
            id,
            NodeKind::Leaf {
                block_type: block_type.into(),
                text: text.into(),
            },
        )
    }

    /// Plain text carried by the node itself, excluding descendants.
    pub fn own_text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Leaf { text, .. } if !text.is_empty() => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> NotionId {
        NotionId::parse(&format!("{:032x}", n)).unwrap()
    }

    #[test]
    fn type_names_follow_notion_discriminants() {
        assert_eq!(Node::child_page(id(1), "A").kind.type_name(), "child_page");
        assert_eq!(NodeKind::ColumnList.type_name(), "column_list");
        assert_eq!(Node::leaf(id(2), "toggle", "x").kind.type_name(), "toggle");
    }

    #[test]
    fn own_text_skips_empty_and_structural_nodes() {
        assert_eq!(Node::leaf(id(1), "paragraph", "hi").own_text(), Some("hi"));
        assert_eq!(Node::leaf(id(2), "divider", "").own_text(), None);
        assert_eq!(Node::new(id(3), NodeKind::Column).own_text(), None);
    }
}
