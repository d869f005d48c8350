// src/api/parser.rs
//! Mapping Notion JSON onto the domain model.
//!
//! Block payloads go through notion-client's serde types and are then
//! classified with a single exhaustive match. A block the library cannot
//! decode still yields a `Leaf` so that one exotic block never hides its
//! siblings.

use super::pagination::Paginated;
use super::responses::{
    NotionBlock, NotionErrorBody, NotionProperty, NotionRichText, RawPage, RawParent, RawUser,
};
use crate::constants::{ERROR_BODY_PREVIEW_LENGTH, UNTITLED};
use crate::error::{AppError, NotionClientError, NotionErrorCode};
use crate::model::{AuthorHints, Node, NodeKind, Page, Parent, UserRef};
use crate::types::{NotionId, UserId};
use notion_client::objects::block::{BlockType, SyncedFrom};
use serde_json::Value;
use std::time::Duration;

/// Decodes a successful body, keeping a preview of it for diagnostics.
fn decode<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, AppError> {
    serde_json::from_str(body).map_err(|e| {
        NotionClientError::Deserialization {
            source: e,
            body: preview(body),
        }
        .into()
    })
}

/// The start of a response body, cut on a character boundary.
pub fn preview(body: &str) -> String {
    if body.len() > ERROR_BODY_PREVIEW_LENGTH {
        let cut = (0..=ERROR_BODY_PREVIEW_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}

/// Builds the error for a non-2xx response.
pub fn parse_error(status: u16, body: &str, retry_after: Option<Duration>) -> AppError {
    match serde_json::from_str::<NotionErrorBody>(body) {
        Ok(err) => AppError::NotionService {
            code: NotionErrorCode::from_api_response(&err.code),
            message: err.message,
            status,
            retry_after,
        },
        Err(_) => AppError::NotionService {
            code: NotionErrorCode::from_http_status(status),
            message: format!("HTTP {}: {}", status, preview(body)),
            status,
            retry_after,
        },
    }
}

// --- Blocks ---

/// Parses a `blocks/{id}/children` page.
pub fn parse_children(body: &str) -> Result<Paginated<Node>, AppError> {
    let page: Paginated<Value> = decode(body)?;
    let results = page
        .results
        .into_iter()
        .map(classify_value)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Paginated {
        results,
        next_cursor: page.next_cursor,
        has_more: page.has_more,
    })
}

/// Parses a `blocks/{id}` response.
pub fn parse_block(body: &str) -> Result<Node, AppError> {
    classify_value(decode(body)?)
}

/// Classifies one raw block object.
pub fn classify_value(value: Value) -> Result<Node, AppError> {
    let id = value
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| NotionClientError::ConversionError {
            message: "Block missing required ID field".to_string(),
        })
        .and_then(|raw| {
            NotionId::parse(raw).map_err(|e| NotionClientError::ConversionError {
                message: e.to_string(),
            })
        })?;
    let has_children = value
        .get("has_children")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let type_name = value
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("unsupported")
        .to_string();
    let parent = value
        .get("parent")
        .cloned()
        .and_then(|p| serde_json::from_value::<RawParent>(p).ok())
        .map(Parent::from);
    let caption = raw_caption(&value, &type_name);

    let kind = match serde_json::from_value::<NotionBlock>(value) {
        Ok(block) => classify(block.block_type, type_name),
        Err(e) => {
            log::debug!("Block {} ({}) not decodable: {}", id, type_name, e);
            NodeKind::Leaf {
                block_type: type_name,
                text: String::new(),
            }
        }
    };
    // Media payloads (image, video, audio, embed) are typed without their caption.
    let kind = match kind {
        NodeKind::Leaf { block_type, text } if text.is_empty() => NodeKind::Leaf {
            block_type,
            text: caption,
        },
        other => other,
    };

    Ok(Node {
        id,
        has_children,
        kind,
        parent,
    })
}

/// The `plain_text` of a block's `caption` runs, read from the raw payload.
fn raw_caption(value: &Value, type_name: &str) -> String {
    value
        .get(type_name)
        .and_then(|payload| payload.get("caption"))
        .and_then(Value::as_array)
        .map(|runs| {
            runs.iter()
                .filter_map(|run| run.get("plain_text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// The node kind and plain-text payload of a decoded block.
pub fn classify(block_type: BlockType, type_name: String) -> NodeKind {
    let leaf = |text: String| NodeKind::Leaf {
        block_type: type_name.clone(),
        text,
    };

    match block_type {
        BlockType::ChildPage { child_page } => NodeKind::ChildPage {
            title: child_page.title,
        },
        BlockType::ChildDatabase { child_database } => NodeKind::ChildDatabase {
            title: child_database.title,
        },
        BlockType::ColumnList { .. } => NodeKind::ColumnList,
        BlockType::Column { .. } => NodeKind::Column,
        BlockType::SyncedBlock { synced_block } => NodeKind::SyncedBlock {
            synced_from: synced_block
                .synced_from
                .and_then(|SyncedFrom::BlockId { block_id }| {
                    NotionId::parse(&block_id)
                        .map_err(|e| log::warn!("Ignoring synced_from '{}': {}", block_id, e))
                        .ok()
                }),
        },

        BlockType::Paragraph { paragraph } => leaf(plain_text(&paragraph.rich_text)),
        BlockType::Heading1 { heading_1 } => leaf(plain_text(&heading_1.rich_text)),
        BlockType::Heading2 { heading_2 } => leaf(plain_text(&heading_2.rich_text)),
        BlockType::Heading3 { heading_3 } => leaf(plain_text(&heading_3.rich_text)),
        BlockType::BulletedListItem { bulleted_list_item } => {
            leaf(plain_text(&bulleted_list_item.rich_text))
        }
        BlockType::NumberedListItem { numbered_list_item } => {
            leaf(plain_text(&numbered_list_item.rich_text))
        }
        BlockType::ToDo { to_do } => leaf(plain_text(&to_do.rich_text)),
        BlockType::Toggle { toggle } => leaf(plain_text(&toggle.rich_text)),
        BlockType::Quote { quote } => leaf(plain_text(&quote.rich_text)),
        BlockType::Callout { callout } => leaf(plain_text(&callout.rich_text)),
        BlockType::Template { template } => leaf(plain_text(&template.rich_text)),
        BlockType::Code { code } => leaf(join_nonempty([
            plain_text(&code.rich_text),
            plain_text(&code.caption),
        ])),
        BlockType::Equation { equation } => leaf(equation.expression),
        BlockType::Bookmark { bookmark } => leaf(plain_text(&bookmark.caption)),
        BlockType::File { file } => leaf(plain_text(&file.caption)),
        BlockType::Pdf { pdf } => leaf(plain_text(&pdf.caption)),
        BlockType::TableRow { table_row } => leaf(join_nonempty(
            table_row.cells.iter().map(|cell| plain_text(cell)),
        )),
        _ => leaf(String::new()),
    }
}

/// Concatenates the `plain_text` of rich-text runs.
pub fn plain_text(runs: &[NotionRichText]) -> String {
    runs.iter()
        .map(|run| match run {
            NotionRichText::Text {
                text, plain_text, ..
            } => plain_text.clone().unwrap_or_else(|| text.content.clone()),
            NotionRichText::Mention { plain_text, .. } => plain_text.clone(),
            NotionRichText::Equation { plain_text, .. } => plain_text.clone(),
            _ => String::new(),
        })
        .collect()
}

fn join_nonempty(parts: impl IntoIterator<Item = String>) -> String {
    parts
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// --- Pages ---

/// Parses a `pages/{id}` response.
pub fn parse_page(body: &str) -> Result<Page, AppError> {
    Ok(convert_page(decode(body)?))
}

/// Parses a database query or search page. Rows that are not page objects
/// or cannot be decoded are skipped with a warning.
pub fn parse_pages(body: &str) -> Result<Paginated<Page>, AppError> {
    let page: Paginated<Value> = decode(body)?;
    let results = page
        .results
        .into_iter()
        .filter(|row| row.get("object").and_then(Value::as_str) != Some("database"))
        .filter_map(|row| match serde_json::from_value::<RawPage>(row) {
            Ok(raw) => Some(convert_page(raw)),
            Err(e) => {
                log::warn!("Skipping undecodable page row: {}", e);
                None
            }
        })
        .collect();
    Ok(Paginated {
        results,
        next_cursor: page.next_cursor,
        has_more: page.has_more,
    })
}

/// Parses a `users/{id}` response.
pub fn parse_user(body: &str) -> Result<UserRef, AppError> {
    let raw: RawUser = decode(body)?;
    Ok(raw.into())
}

/// Converts a raw page, extracting title, author hints and status.
pub fn convert_page(raw: RawPage) -> Page {
    let mut title = None;
    let mut hints = AuthorHints::default();
    let mut status = None;

    for (name, value) in raw.properties {
        let property = match serde_json::from_value::<NotionProperty>(value) {
            Ok(p) => p,
            Err(e) => {
                log::debug!("Skipping page property '{}': {}", name, e);
                continue;
            }
        };

        match property {
            NotionProperty::Title { title: runs, .. } if title.is_none() => {
                title = Some(plain_text(&runs));
            }
            NotionProperty::People { people, .. } if hints.person.is_none() => {
                if let Some(first) = people.into_iter().next() {
                    hints.person = Some(UserRef {
                        id: UserId::new(first.id),
                        name: first.name,
                    });
                }
            }
            NotionProperty::RichText { rich_text, .. }
                if hints.text.is_none() && name.to_lowercase().contains("author") =>
            {
                let text = plain_text(&rich_text);
                if !text.trim().is_empty() {
                    hints.text = Some(text.trim().to_string());
                }
            }
            NotionProperty::Status {
                status: Some(value),
                ..
            } if status.is_none() => {
                status = value.name;
            }
            NotionProperty::Select {
                select: Some(value),
                ..
            } if status.is_none() && name.to_lowercase().contains("status") => {
                status = value.name;
            }
            _ => {}
        }
    }

    let title = title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());
    let url = raw
        .url
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| raw.id.web_url());

    Page {
        id: raw.id,
        title,
        url,
        public_url: raw.public_url.filter(|u| !u.is_empty()),
        created_time: raw.created_time,
        last_edited_time: raw.last_edited_time,
        created_by: raw.created_by.map(UserRef::from),
        last_edited_by: raw.last_edited_by.map(UserRef::from),
        author_hints: hints,
        status,
        archived: raw.archived,
        parent: raw.parent.map(Parent::from).unwrap_or(Parent::Unknown),
    }
}
