// src/slack/webhook.rs
use super::{ChatMessage, ChatRelay};
use crate::api::parser::preview;
use crate::error::AppError;
use crate::types::ValidatedUrl;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

/// Posts messages to a Slack incoming webhook.
#[derive(Clone)]
pub struct WebhookRelay {
    client: Client,
    url: ValidatedUrl,
    channel: Option<String>,
}

impl WebhookRelay {
    pub fn new(url: ValidatedUrl, channel: Option<String>) -> Result<Self, AppError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self::with_client(client, url, channel))
    }

    pub fn with_client(client: Client, url: ValidatedUrl, channel: Option<String>) -> Self {
        Self {
            client,
            url,
            channel,
        }
    }

    /// The JSON body sent for `message`.
    pub fn payload(&self, message: &ChatMessage) -> serde_json::Value {
        let mut body = json!({ "text": message.text });
        if let Some(blocks) = &message.blocks {
            body["blocks"] = json!(blocks);
        }
        if let Some(channel) = &self.channel {
            body["channel"] = json!(channel);
        }
        body
    }
}

#[async_trait::async_trait]
impl ChatRelay for WebhookRelay {
    async fn post(&self, message: &ChatMessage) -> Result<(), AppError> {
        log::debug!("Posting to webhook {}", self.url);
        let response = self
            .client
            .post(self.url.as_str())
            .json(&self.payload(message))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(AppError::SlackDelivery {
            status: Some(status.as_u16()),
            message: preview(&body),
        })
    }
}
