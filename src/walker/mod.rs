// src/walker/mod.rs
//! Depth-first traversal of a Notion page tree.
//!
//! The walk keeps an explicit stack of steps instead of recursing, so deep
//! trees cost heap, not call stack. Each node is visited at most once per
//! walk. A child listing is always drained completely before any of its
//! children is processed.
//!
//! Failures below the starting node never abort the walk; they are logged
//! and recorded as [`AccessGap`]s. Only failing to list the starting node's
//! own children (or to retrieve it, with `include_root`) is fatal, along
//! with running past the deadline.

mod options;
mod report;

pub use options::{Separator, WalkOptions};
pub use report::{AccessGap, GapReason, WalkReport};

use crate::api::NotionRepository;
use crate::error::AppError;
use crate::model::{Node, NodeKind};
use crate::types::NotionId;
use std::collections::HashSet;
use std::time::Instant;

/// A unit of pending work.
enum Step {
    /// List the children of `id` and schedule them.
    Expand {
        id: NotionId,
        depth: usize,
        branch: Option<usize>,
        expects_children: bool,
        /// `id` is the original of a synced block.
        synced_original: bool,
    },
    /// Handle one already-listed node.
    Visit {
        node: Node,
        depth: usize,
        branch: Option<usize>,
    },
}

/// Walks the tree below one starting id.
pub struct TreeWalker<'a, R: NotionRepository + ?Sized> {
    repo: &'a R,
    options: WalkOptions,
}

/// Mutable state of a single walk.
#[derive(Default)]
struct WalkState {
    visited: HashSet<NotionId>,
    stack: Vec<Step>,
    report: WalkReport,
}

impl<'a, R: NotionRepository + ?Sized> TreeWalker<'a, R> {
    pub fn new(repo: &'a R, options: WalkOptions) -> Self {
        Self { repo, options }
    }

    /// Walks everything reachable from `root`.
    pub async fn walk(&self, root: &NotionId) -> Result<WalkReport, AppError> {
        let started = Instant::now();
        let mut state = WalkState::default();

        if self.options.include_root {
            let page = self.repo.retrieve_page(root).await?;
            state.report.pages.insert(root.clone(), page);
        }
        state.visited.insert(root.clone());

        let children = self.repo.children_of(root).await?;
        log::debug!("Root {} has {} children", root, children.len());
        if self.options.collect_text {
            state.report.branch_texts = vec![String::new(); children.len()];
        }
        for (index, node) in children.into_iter().enumerate().rev() {
            state.stack.push(Step::Visit {
                node,
                depth: 1,
                branch: Some(index),
            });
        }

        while let Some(step) = state.stack.pop() {
            if let Some(deadline) = self.options.deadline {
                if started.elapsed() >= deadline {
                    return Err(AppError::DeadlineExceeded(deadline));
                }
            }

            match step {
                Step::Expand {
                    id,
                    depth,
                    branch,
                    expects_children,
                    synced_original,
                } => {
                    self.expand(&mut state, id, depth, branch, expects_children, synced_original)
                        .await
                }
                Step::Visit {
                    node,
                    depth,
                    branch,
                } => self.visit(&mut state, node, depth, branch).await,
            }
        }

        log::info!(
            "Walked {} nodes under {}: {} pages, {} gaps",
            state.report.nodes_visited,
            root,
            state.report.pages.len(),
            state.report.gaps.len()
        );
        Ok(state.report)
    }

    /// Lists the children of `id` and schedules them left to right.
    async fn expand(
        &self,
        state: &mut WalkState,
        id: NotionId,
        depth: usize,
        branch: Option<usize>,
        expects_children: bool,
        synced_original: bool,
    ) {
        if depth >= self.options.max_depth {
            log::warn!(
                "Max depth ({}) reached at {}; not descending",
                self.options.max_depth,
                id
            );
            state.report.depth_limited = true;
            return;
        }

        let children = match self.repo.children_of(&id).await {
            Ok(children) => children,
            Err(e) if synced_original => {
                log::debug!("Children of synced original {} unavailable: {}", id, e);
                record_gap(state, id, GapReason::SyncedOriginalInaccessible);
                return;
            }
            Err(e) => {
                record_gap(state, id, GapReason::FetchFailed(e.to_string()));
                return;
            }
        };

        if children.is_empty() {
            if expects_children {
                record_gap(state, id, GapReason::EmptyChildren);
            }
            return;
        }

        log::debug!("{} has {} children", id, children.len());
        for node in children.into_iter().rev() {
            state.stack.push(Step::Visit {
                node,
                depth: depth + 1,
                branch,
            });
        }
    }

    async fn visit(&self, state: &mut WalkState, node: Node, depth: usize, branch: Option<usize>) {
        if !state.visited.insert(node.id.clone()) {
            log::debug!("Already visited {}", node.id);
            return;
        }
        state.report.nodes_visited += 1;

        match node.kind {
            NodeKind::ChildPage { .. } | NodeKind::ChildDatabase { .. }
                if !self.options.follow_pages => {}

            NodeKind::ChildPage { .. } => match self.repo.retrieve_page(&node.id).await {
                Ok(page) => {
                    state.report.pages.entry(node.id.clone()).or_insert(page);
                    state.stack.push(Step::Expand {
                        id: node.id,
                        depth,
                        branch,
                        expects_children: node.has_children,
                        synced_original: false,
                    });
                }
                Err(e) => record_gap(state, node.id, GapReason::PageUnavailable(e.to_string())),
            },

            NodeKind::ChildDatabase { .. } => match self.repo.database_rows(&node.id).await {
                Ok(rows) => {
                    let mut fresh = Vec::new();
                    for row in rows {
                        if state.visited.insert(row.id.clone()) {
                            fresh.push(row.id.clone());
                            state.report.pages.entry(row.id.clone()).or_insert(row);
                        }
                    }
                    for row_id in fresh.into_iter().rev() {
                        state.stack.push(Step::Expand {
                            id: row_id,
                            depth,
                            branch,
                            expects_children: false,
                            synced_original: false,
                        });
                    }
                }
                Err(e) => record_gap(state, node.id, GapReason::FetchFailed(e.to_string())),
            },

            NodeKind::ColumnList | NodeKind::Column => state.stack.push(Step::Expand {
                id: node.id,
                depth,
                branch,
                expects_children: node.has_children,
                synced_original: false,
            }),

            NodeKind::SyncedBlock {
                synced_from: Some(original),
            } => {
                if state.visited.contains(&original) {
                    return;
                }
                match self.repo.retrieve_block(&original).await {
                    Ok(block) => {
                        state.visited.insert(original.clone());
                        state.stack.push(Step::Expand {
                            id: original,
                            depth,
                            branch,
                            expects_children: block.has_children,
                            synced_original: true,
                        });
                    }
                    Err(e) => {
                        log::debug!("Synced original {} unavailable: {}", original, e);
                        record_gap(state, original, GapReason::SyncedOriginalInaccessible);
                    }
                }
            }

            NodeKind::SyncedBlock { synced_from: None } | NodeKind::Leaf { .. } => {
                if self.options.collect_text {
                    if let NodeKind::Leaf { text, .. } = &node.kind {
                        append_text(state, text, branch, self.options.separator);
                    }
                }
                if node.has_children {
                    state.stack.push(Step::Expand {
                        id: node.id,
                        depth,
                        branch,
                        expects_children: true,
                        synced_original: false,
                    });
                }
            }
        }
    }
}

fn record_gap(state: &mut WalkState, node_id: NotionId, reason: GapReason) {
    log::warn!("Skipping {}: {}", node_id, reason);
    state.report.gaps.push(AccessGap { node_id, reason });
}

fn append_text(state: &mut WalkState, text: &str, branch: Option<usize>, separator: Separator) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    push_joined(&mut state.report.text, text, separator);
    if let Some(slot) = branch.and_then(|b| state.report.branch_texts.get_mut(b)) {
        push_joined(slot, text, separator);
    }
}

fn push_joined(buffer: &mut String, text: &str, separator: Separator) {
    if !buffer.is_empty() {
        buffer.push_str(separator.as_str());
    }
    buffer.push_str(text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::Call;
    use crate::api::InMemoryNotion;
    use crate::model::Page;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn id(n: u32) -> NotionId {
        NotionId::parse(&format!("{:032x}", n)).unwrap()
    }

    fn page(n: u32, title: &str) -> Page {
        Page::new(id(n), title, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    fn para(n: u32, text: &str) -> Node {
        Node::leaf(id(n), "paragraph", text)
    }

    fn titles(report: &WalkReport) -> Vec<&str> {
        report.pages.values().map(|p| p.title.as_str()).collect()
    }

    fn text_walk() -> WalkOptions {
        WalkOptions::page_text(Separator::Space)
    }

    const ROOT: u32 = 1000;

    #[tokio::test]
    async fn pages_reachable_twice_are_reported_once() {
        let repo = InMemoryNotion::new()
            .with_children(&id(ROOT), vec![Node::child_page(id(1), "A"), Node::child_page(id(2), "B")])
            .with_children(&id(1), vec![Node::child_page(id(3), "C").with_children(false)])
            .with_children(
                &id(2),
                vec![Node::child_page(id(3), "C").with_children(false), Node::child_page(id(1), "A")],
            )
            .with_page(page(1, "A"))
            .with_page(page(2, "B"))
            .with_page(page(3, "C"));

        let report = TreeWalker::new(&repo, WalkOptions::pages())
            .walk(&id(ROOT))
            .await
            .unwrap();

        assert_eq!(titles(&report), vec!["A", "C", "B"]);
        let retrievals = repo
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::RetrievePage(_)))
            .count();
        assert_eq!(retrievals, 3);
        assert!(report.gaps.is_empty());
    }

    #[tokio::test]
    async fn column_text_is_collected_left_to_right() {
        let repo = InMemoryNotion::new()
            .with_children(
                &id(ROOT),
                vec![
                    para(1, "one"),
                    Node::new(id(2), NodeKind::ColumnList),
                    para(3, "five"),
                ],
            )
            .with_children(
                &id(2),
                vec![Node::new(id(20), NodeKind::Column), Node::new(id(21), NodeKind::Column)],
            )
            .with_children(&id(20), vec![para(200, "two"), para(201, "three")])
            .with_children(&id(21), vec![para(210, "four")]);

        let report = TreeWalker::new(&repo, text_walk()).walk(&id(ROOT)).await.unwrap();

        assert_eq!(report.text, "one two three four five");
        assert_eq!(report.branch_texts, vec!["one", "two three four", "five"]);
        assert!(report.gaps.is_empty());
    }

    #[tokio::test]
    async fn newline_separator_is_honoured() {
        let repo = InMemoryNotion::new()
            .with_children(&id(ROOT), vec![para(1, "a"), para(2, ""), para(3, "b")]);
        let report = TreeWalker::new(&repo, WalkOptions::page_text(Separator::Newline))
            .walk(&id(ROOT))
            .await
            .unwrap();
        assert_eq!(report.text, "a\nb");
    }

    #[tokio::test]
    async fn inaccessible_synced_original_is_one_gap_and_no_text() {
        let original = id(50);
        let repo = InMemoryNotion::new()
            .with_children(
                &id(ROOT),
                vec![
                    Node::new(
                        id(1),
                        NodeKind::SyncedBlock {
                            synced_from: Some(original.clone()),
                        },
                    )
                    .with_children(true),
                    para(2, "sibling"),
                ],
            )
            .with_children(&original, vec![para(51, "secret")])
            .deny(&original);

        let report = TreeWalker::new(&repo, text_walk()).walk(&id(ROOT)).await.unwrap();

        assert_eq!(
            report.gaps,
            vec![AccessGap {
                node_id: original,
                reason: GapReason::SyncedOriginalInaccessible
            }]
        );
        assert_eq!(report.text, "sibling");
        assert!(!repo.calls().contains(&Call::ListChildren(id(1), None)));
    }

    #[tokio::test]
    async fn unlistable_synced_original_is_reported_as_inaccessible() {
        let original = id(50);
        let repo = InMemoryNotion::new()
            .with_children(
                &id(ROOT),
                vec![
                    Node::new(
                        id(1),
                        NodeKind::SyncedBlock {
                            synced_from: Some(original.clone()),
                        },
                    ),
                    para(2, "sibling"),
                ],
            )
            .with_block(Node::new(original.clone(), NodeKind::SyncedBlock { synced_from: None }).with_children(true))
            .deny_listing(&original);

        let report = TreeWalker::new(&repo, text_walk()).walk(&id(ROOT)).await.unwrap();

        assert_eq!(
            report.gaps,
            vec![AccessGap {
                node_id: original.clone(),
                reason: GapReason::SyncedOriginalInaccessible
            }]
        );
        assert_eq!(report.text, "sibling");
        assert!(repo.calls().contains(&Call::RetrieveBlock(original)));
    }

    #[tokio::test]
    async fn accessible_synced_original_is_read_in_place() {
        let original = id(50);
        let repo = InMemoryNotion::new()
            .with_children(
                &id(ROOT),
                vec![
                    para(1, "before"),
                    Node::new(
                        id(2),
                        NodeKind::SyncedBlock {
                            synced_from: Some(original.clone()),
                        },
                    ),
                    para(3, "after"),
                ],
            )
            .with_block(Node::new(original.clone(), NodeKind::SyncedBlock { synced_from: None }).with_children(true))
            .with_children(&original, vec![para(51, "shared")]);

        let report = TreeWalker::new(&repo, text_walk()).walk(&id(ROOT)).await.unwrap();
        assert_eq!(report.text, "before shared after");
        assert!(report.gaps.is_empty());
    }

    #[tokio::test]
    async fn all_pages_of_a_listing_are_fetched_before_recursing() {
        let children: Vec<Node> = (1..=300).map(|n| Node::child_page(id(n), format!("P{}", n)).with_children(false)).collect();
        let mut repo = InMemoryNotion::new()
            .with_page_size(100)
            .with_children(&id(ROOT), children);
        for n in 1..=300 {
            repo = repo.with_page(page(n, &format!("P{}", n)));
        }

        let report = TreeWalker::new(&repo, WalkOptions::pages())
            .walk(&id(ROOT))
            .await
            .unwrap();

        assert_eq!(report.pages.len(), 300);
        let calls = repo.calls();
        assert_eq!(
            calls[..3],
            [
                Call::ListChildren(id(ROOT), None),
                Call::ListChildren(id(ROOT), Some("100".into())),
                Call::ListChildren(id(ROOT), Some("200".into())),
            ]
        );
        assert_eq!(calls[3], Call::RetrievePage(id(1)));
        assert_eq!(report.pages.keys().next(), Some(&id(1)));
        assert_eq!(report.pages.keys().last(), Some(&id(300)));
    }

    #[tokio::test]
    async fn empty_listing_after_has_children_is_a_gap() {
        let repo = InMemoryNotion::new().with_children(
            &id(ROOT),
            vec![Node::leaf(id(1), "toggle", "Details").with_children(true), para(2, "next")],
        );

        let report = TreeWalker::new(&repo, text_walk()).walk(&id(ROOT)).await.unwrap();

        assert_eq!(
            report.gaps,
            vec![AccessGap {
                node_id: id(1),
                reason: GapReason::EmptyChildren
            }]
        );
        assert_eq!(report.text, "Details next");
    }

    #[tokio::test]
    async fn failures_below_the_root_do_not_stop_siblings() {
        let repo = InMemoryNotion::new()
            .with_children(
                &id(ROOT),
                vec![
                    Node::child_page(id(1), "Hidden"),
                    Node::child_page(id(2), "Visible"),
                    Node::child_database(id(3), "Tasks"),
                ],
            )
            .with_page(page(1, "Hidden"))
            .deny(&id(1))
            .with_page(page(2, "Visible"))
            .with_children(&id(2), vec![Node::leaf(id(20), "toggle", "").with_children(true)])
            .deny(&id(20));

        let report = TreeWalker::new(&repo, WalkOptions::pages())
            .walk(&id(ROOT))
            .await
            .unwrap();

        assert_eq!(titles(&report), vec!["Visible"]);
        let reasons: Vec<_> = report.gaps.iter().map(|g| (g.node_id.clone(), &g.reason)).collect();
        assert_eq!(reasons.len(), 3);
        assert!(matches!(reasons[0], (ref n, GapReason::PageUnavailable(_)) if *n == id(1)));
        assert!(matches!(reasons[1], (ref n, GapReason::FetchFailed(_)) if *n == id(20)));
        assert!(matches!(reasons[2], (ref n, GapReason::FetchFailed(_)) if *n == id(3)));
    }

    #[tokio::test]
    async fn root_failure_is_fatal() {
        let repo = InMemoryNotion::new().deny(&id(ROOT));
        let result = TreeWalker::new(&repo, WalkOptions::pages()).walk(&id(ROOT)).await;
        assert!(matches!(result, Err(ref e) if e.is_access_denied()));
    }

    #[tokio::test]
    async fn database_rows_are_reported_before_their_subtrees() {
        let db = id(3);
        let repo = InMemoryNotion::new()
            .with_children(&id(ROOT), vec![Node::child_database(db.clone(), "Docs")])
            .with_rows(&db, vec![page(10, "Row 1"), page(11, "Row 2")])
            .with_children(&id(10), vec![Node::child_page(id(12), "Nested")])
            .with_page(page(12, "Nested"));

        let report = TreeWalker::new(&repo, WalkOptions::pages())
            .walk(&id(ROOT))
            .await
            .unwrap();

        assert_eq!(titles(&report), vec!["Row 1", "Row 2", "Nested"]);
    }

    #[tokio::test]
    async fn text_mode_treats_pages_and_databases_as_boundaries() {
        let repo = InMemoryNotion::new()
            .with_children(
                &id(ROOT),
                vec![
                    para(1, "mine"),
                    Node::child_page(id(2), "Sub"),
                    Node::child_database(id(3), "Db"),
                ],
            )
            .with_page(page(2, "Sub"))
            .with_children(&id(2), vec![para(20, "theirs")]);

        let report = TreeWalker::new(&repo, text_walk()).walk(&id(ROOT)).await.unwrap();

        assert_eq!(report.text, "mine");
        assert!(report.pages.is_empty());
        assert_eq!(repo.calls(), vec![Call::ListChildren(id(ROOT), None)]);
    }

    #[tokio::test]
    async fn depth_guard_stops_expansion() {
        let repo = InMemoryNotion::new()
            .with_children(&id(ROOT), vec![Node::leaf(id(1), "toggle", "top").with_children(true)])
            .with_children(&id(1), vec![para(2, "nested")]);

        let options = WalkOptions {
            max_depth: 1,
            ..text_walk()
        };
        let report = TreeWalker::new(&repo, options).walk(&id(ROOT)).await.unwrap();

        assert_eq!(report.text, "top");
        assert!(report.depth_limited);
    }

    #[tokio::test]
    async fn include_root_reports_the_starting_page_first() {
        let repo = InMemoryNotion::new()
            .with_page(page(ROOT, "Root"))
            .with_children(&id(ROOT), vec![Node::child_page(id(1), "Child").with_children(false)])
            .with_page(page(1, "Child"));

        let report = TreeWalker::new(&repo, WalkOptions::pages().with_root())
            .walk(&id(ROOT))
            .await
            .unwrap();

        assert_eq!(titles(&report), vec!["Root", "Child"]);
    }

    #[tokio::test]
    async fn expired_deadline_aborts_the_walk() {
        let repo = InMemoryNotion::new().with_children(&id(ROOT), vec![para(1, "x")]);
        let result = TreeWalker::new(&repo, text_walk().with_deadline(Some(Duration::ZERO)))
            .walk(&id(ROOT))
            .await;
        assert!(matches!(result, Err(AppError::DeadlineExceeded(_))));
    }
}
