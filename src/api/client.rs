// src/api/client.rs
//! HTTP client for the Notion API.
//!
//! Every request goes through [`NotionHttpClient::send`], which paces
//! requests and applies the retry policy. Parsing lives in `parser`.

use super::pagination::{page_size, Paginated};
use super::parser;
use crate::constants::{NOTION_API_BASE, NOTION_API_VERSION};
use crate::error::AppError;
use crate::error_recovery::RetryPolicy;
use crate::model::{Node, Page, UserRef};
use crate::types::{ApiKey, NotionId, UserId};
use reqwest::{header, Client, Method};
use serde_json::{json, Value};
use std::time::Duration;

/// Authenticated Notion client with pacing and retries.
#[derive(Clone)]
pub struct NotionHttpClient {
    client: Client,
    retry: RetryPolicy,
    request_interval: Duration,
}

impl NotionHttpClient {
    /// Creates a new HTTP client with Notion API authentication.
    pub fn new(
        api_key: &ApiKey,
        retry: RetryPolicy,
        request_interval: Duration,
    ) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers(api_key)?)
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            retry,
            request_interval,
        })
    }

    /// Creates the default headers for Notion API requests.
    fn create_headers(api_key: &ApiKey) -> Result<header::HeaderMap, AppError> {
        let mut headers = header::HeaderMap::new();

        let auth_header = format!("Bearer {}", api_key.as_str());
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&auth_header).map_err(|e| {
                AppError::MissingConfiguration(format!("Invalid API token format: {}", e))
            })?,
        );

        headers.insert(
            "Notion-Version",
            header::HeaderValue::from_static(NOTION_API_VERSION),
        );

        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        Ok(headers)
    }

    /// Sends one request and returns the body of a successful response.
    ///
    /// Transient failures are retried per the configured policy; any other
    /// non-2xx status becomes an `AppError::NotionService`.
    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<String, AppError> {
        let url = format!("{}/{}", NOTION_API_BASE, endpoint);
        let label = format!("{} {}", method, endpoint);

        self.retry
            .run(&label, || {
                let mut request = self.client.request(method.clone(), &url).query(query);
                if let Some(body) = body {
                    request = request.json(body);
                }
                let interval = self.request_interval;
                let label = label.clone();

                async move {
                    tokio::time::sleep(interval).await;
                    log::debug!("{}", label);

                    let response = request.send().await?;
                    let status = response.status();
                    let retry_after = retry_after(response.headers());
                    let text = response.text().await?;

                    if status.is_success() {
                        Ok(text)
                    } else {
                        Err(parser::parse_error(status.as_u16(), &text, retry_after))
                    }
                }
            })
            .await
    }

    fn cursor_query(cursor: Option<String>) -> Vec<(&'static str, String)> {
        let mut query = vec![("page_size", page_size().to_string())];
        if let Some(cursor) = cursor {
            query.push(("start_cursor", cursor));
        }
        query
    }

    fn cursor_body(mut body: Value, cursor: Option<String>) -> Value {
        body["page_size"] = json!(page_size());
        if let Some(cursor) = cursor {
            body["start_cursor"] = json!(cursor);
        }
        body
    }
}

/// Reads a `Retry-After` header given in whole seconds.
fn retry_after(headers: &header::HeaderMap) -> Option<Duration> {
    headers
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[async_trait::async_trait]
impl super::NotionRepository for NotionHttpClient {
    async fn list_children(
        &self,
        id: &NotionId,
        cursor: Option<String>,
    ) -> Result<Paginated<Node>, AppError> {
        let endpoint = format!("blocks/{}/children", id.to_hyphenated());
        let body = self
            .send(Method::GET, &endpoint, &Self::cursor_query(cursor), None)
            .await?;
        parser::parse_children(&body)
    }

    async fn retrieve_block(&self, id: &NotionId) -> Result<Node, AppError> {
        let endpoint = format!("blocks/{}", id.to_hyphenated());
        let body = self.send(Method::GET, &endpoint, &[], None).await?;
        parser::parse_block(&body)
    }

    async fn retrieve_page(&self, id: &NotionId) -> Result<Page, AppError> {
        let endpoint = format!("pages/{}", id.to_hyphenated());
        let body = self.send(Method::GET, &endpoint, &[], None).await?;
        parser::parse_page(&body)
    }

    async fn query_database(
        &self,
        id: &NotionId,
        cursor: Option<String>,
    ) -> Result<Paginated<Page>, AppError> {
        let endpoint = format!("databases/{}/query", id.to_hyphenated());
        let request = Self::cursor_body(json!({}), cursor);
        let body = self
            .send(Method::POST, &endpoint, &[], Some(&request))
            .await?;
        parser::parse_pages(&body)
    }

    async fn retrieve_user(&self, id: &UserId) -> Result<UserRef, AppError> {
        let endpoint = format!("users/{}", id.as_str());
        let body = self.send(Method::GET, &endpoint, &[], None).await?;
        parser::parse_user(&body)
    }

    async fn search_pages(&self, cursor: Option<String>) -> Result<Paginated<Page>, AppError> {
        let request = Self::cursor_body(
            json!({ "filter": { "property": "object", "value": "page" } }),
            cursor,
        );
        let body = self.send(Method::POST, "search", &[], Some(&request)).await?;
        parser::parse_pages(&body)
    }
}
