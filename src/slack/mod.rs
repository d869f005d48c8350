// src/slack/mod.rs
//! Delivery to Slack.
//!
//! Pipelines depend on [`ChatRelay`]; `webhook` posts to a real incoming
//! webhook and `memory` records messages for tests. File attachments go
//! through [`FileUploader`], which needs a bot token.

pub mod memory;
mod upload;
mod webhook;

pub use memory::RecordingRelay;
pub use upload::{FileUploader, UploadedFile};
pub use webhook::WebhookRelay;

use crate::error::AppError;
use serde::Serialize;
use serde_json::Value;

/// A message: plain text, optionally with Block Kit blocks. Slack shows the
/// blocks when present and uses the text for notifications.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<Value>>,
}

impl ChatMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            blocks: None,
        }
    }

    pub fn with_blocks(mut self, blocks: Vec<Value>) -> Self {
        self.blocks = Some(blocks);
        self
    }
}

/// Somewhere messages can be posted.
#[async_trait::async_trait]
pub trait ChatRelay: Send + Sync {
    /// Posts one message. Any rejection by the service is an error.
    async fn post(&self, message: &ChatMessage) -> Result<(), AppError>;
}

#[cfg(test)]
pub(crate) mod test_server;
