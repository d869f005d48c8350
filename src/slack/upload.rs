// src/slack/upload.rs
//! Slack's external file upload flow.
//!
//! 1. `files.getUploadURLExternal` reserves a file id and an upload URL.
//! 2. The bytes are posted to that URL.
//! 3. `files.completeUploadExternal` shares the file to a channel.
//!
//! Slack reports most failures as HTTP 200 with `{"ok": false}`, so every
//! Web API response body is checked.

use crate::api::parser::preview;
use crate::constants::SLACK_API_BASE;
use crate::error::AppError;
use crate::types::SlackToken;
use reqwest::{header, Client};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct UploadTicket {
    upload_url: String,
    file_id: String,
}

/// A file shared to a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_id: String,
    pub channel: String,
}

/// Uploads files with a bot token.
#[derive(Clone)]
pub struct FileUploader {
    client: Client,
    token: SlackToken,
    api_base: String,
}

impl FileUploader {
    pub fn new(token: SlackToken) -> Result<Self, AppError> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self::with_client(client, token, SLACK_API_BASE))
    }

    pub fn with_client(client: Client, token: SlackToken, api_base: impl Into<String>) -> Self {
        Self {
            client,
            token,
            api_base: api_base.into(),
        }
    }

    /// Uploads `content` as `filename` and shares it to `channel` with a comment.
    pub async fn upload(
        &self,
        filename: &str,
        content: Vec<u8>,
        channel: &str,
        comment: &str,
    ) -> Result<UploadedFile, AppError> {
        let length = content.len().to_string();
        let reply = self
            .call_form(
                "files.getUploadURLExternal",
                &[("filename", filename), ("length", &length)],
            )
            .await?;
        let ticket: UploadTicket = serde_json::from_value(reply)?;
        log::debug!("Reserved Slack file {} for {}", ticket.file_id, filename);

        let response = self.client.post(&ticket.upload_url).body(content).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::SlackDelivery {
                status: Some(status.as_u16()),
                message: format!("file upload rejected: {}", preview(&body)),
            });
        }

        self.call_json(
            "files.completeUploadExternal",
            &json!({
                "files": [{ "id": ticket.file_id, "title": filename }],
                "channel_id": channel,
                "initial_comment": comment,
            }),
        )
        .await?;

        log::info!("Uploaded {} to Slack channel {}", filename, channel);
        Ok(UploadedFile {
            file_id: ticket.file_id,
            channel: channel.to_string(),
        })
    }

    async fn call_form(&self, method: &str, form: &[(&str, &str)]) -> Result<Value, AppError> {
        let request = self
            .client
            .post(format!("{}/{}", self.api_base, method))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token.as_str()))
            .form(form);
        check_reply(method, request.send().await?).await
    }

    async fn call_json(&self, method: &str, body: &Value) -> Result<Value, AppError> {
        let request = self
            .client
            .post(format!("{}/{}", self.api_base, method))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token.as_str()))
            .json(body);
        check_reply(method, request.send().await?).await
    }
}

/// Fails on a non-2xx status or an `"ok": false` body.
async fn check_reply(method: &str, response: reqwest::Response) -> Result<Value, AppError> {
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(AppError::SlackDelivery {
            status: Some(status.as_u16()),
            message: format!("{}: {}", method, preview(&text)),
        });
    }

    let reply: Value = serde_json::from_str(&text)?;
    if reply["ok"].as_bool() == Some(true) {
        Ok(reply)
    } else {
        let error = reply["error"].as_str().unwrap_or("unknown_error");
        Err(AppError::SlackDelivery {
            status: Some(status.as_u16()),
            message: format!("{}: {}", method, error),
        })
    }
}
