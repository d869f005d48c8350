// src/error.rs
//! Application error types.
//!
//! Error types form the vocabulary for failure modes in the system. The
//! variants are grouped by tier: transient remote failures (retried),
//! per-node failures (absorbed by the walker) and configuration failures
//! (fatal at startup).

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Notion API error codes as a typed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotionErrorCode {
    /// API rate limit exceeded, back off and retry
    RateLimited,
    /// The requested object does not exist or is not shared with the integration
    ObjectNotFound,
    /// API key is invalid or expired
    Unauthorized,
    /// API key lacks permission for this resource
    RestrictedResource,
    /// Request body contains invalid JSON
    InvalidJson,
    /// Request parameters failed Notion's validation
    ValidationFailed,
    /// Conflict with current state of the resource
    Conflict,
    /// Notion internal server error
    InternalError,
    /// Notion is temporarily unavailable
    ServiceUnavailable,
    /// HTTP status code fallback when the error body is unparseable
    HttpStatus(u16),
    /// An error code this client doesn't recognize yet
    Unknown(String),
}

impl NotionErrorCode {
    /// Parse a Notion API error code string into the typed vocabulary.
    pub fn from_api_response(code: &str) -> Self {
        match code {
            "rate_limited" => Self::RateLimited,
            "object_not_found" => Self::ObjectNotFound,
            "unauthorized" => Self::Unauthorized,
            "restricted_resource" => Self::RestrictedResource,
            "invalid_json" => Self::InvalidJson,
            "validation_error" => Self::ValidationFailed,
            "conflict_error" => Self::Conflict,
            "internal_server_error" => Self::InternalError,
            "service_unavailable" => Self::ServiceUnavailable,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Create from an HTTP status code when the error body is unparseable.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimited,
            503 => Self::ServiceUnavailable,
            other => Self::HttpStatus(other),
        }
    }

    /// Whether this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited | Self::ServiceUnavailable | Self::InternalError => true,
            Self::HttpStatus(status) => *status == 429 || (500..=599).contains(status),
            _ => false,
        }
    }

    /// Whether the integration simply cannot see this object.
    pub fn is_access_denied(&self) -> bool {
        matches!(
            self,
            Self::ObjectNotFound | Self::RestrictedResource | Self::Unauthorized
        )
    }
}

impl fmt::Display for NotionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate_limited"),
            Self::ObjectNotFound => write!(f, "object_not_found"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::RestrictedResource => write!(f, "restricted_resource"),
            Self::InvalidJson => write!(f, "invalid_json"),
            Self::ValidationFailed => write!(f, "validation_error"),
            Self::Conflict => write!(f, "conflict_error"),
            Self::InternalError => write!(f, "internal_server_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
            Self::HttpStatus(code) => write!(f, "http_{}", code),
            Self::Unknown(code) => write!(f, "{}", code),
        }
    }
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("Notion API returned an error ({code}, HTTP {status}): {message}")]
    NotionService {
        code: NotionErrorCode,
        message: String,
        status: u16,
        retry_after: Option<Duration>,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Slack delivery failed: {message}")]
    SlackDelivery {
        status: Option<u16>,
        message: String,
    },

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Template render error for template {name}: {message}")]
    TemplateRenderError { name: String, message: String },

    #[error("JSON parse error for {path}: {source}")]
    JsonParseError {
        path: std::path::PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to deliver output: {}", failures.join("; "))]
    DeliveryFailed { failures: Vec<String> },

    #[error("Execution budget of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    #[error("Retry budget exhausted after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    #[error(transparent)]
    ValidationError(#[from] crate::types::ValidationError),

    #[error(transparent)]
    NotionClient(#[from] NotionClientError),
}

impl AppError {
    /// Whether a retry has a chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::NotionService { code, .. } => code.is_retryable(),
            AppError::NetworkFailure(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }

    /// The server-requested wait before retrying, when one was sent.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            AppError::NotionService { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Whether the failure means "the integration cannot see this object".
    pub fn is_access_denied(&self) -> bool {
        matches!(self, AppError::NotionService { code, .. } if code.is_access_denied())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}

/// Failures while mapping Notion payloads onto the domain model.
#[derive(Error, Debug)]
pub enum NotionClientError {
    #[error("Failed to deserialize response: {source}\nBody: {body}")]
    Deserialization {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    #[error("Type conversion error: {message}")]
    ConversionError { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_error(code: NotionErrorCode) -> AppError {
        AppError::NotionService {
            code,
            message: "boom".to_string(),
            status: 400,
            retry_after: None,
        }
    }

    #[test]
    fn code_vocabulary_round_trips_through_display() {
        for raw in [
            "rate_limited",
            "object_not_found",
            "restricted_resource",
            "internal_server_error",
            "service_unavailable",
        ] {
            assert_eq!(NotionErrorCode::from_api_response(raw).to_string(), raw);
        }
        assert_eq!(
            NotionErrorCode::from_api_response("brand_new_code"),
            NotionErrorCode::Unknown("brand_new_code".to_string())
        );
    }

    #[test]
    fn retryable_codes() {
        assert!(NotionErrorCode::RateLimited.is_retryable());
        assert!(NotionErrorCode::from_http_status(502).is_retryable());
        assert!(NotionErrorCode::from_http_status(429).is_retryable());
        assert!(!NotionErrorCode::ObjectNotFound.is_retryable());
        assert!(!NotionErrorCode::from_http_status(404).is_retryable());
    }

    #[test]
    fn access_denied_classification() {
        assert!(service_error(NotionErrorCode::ObjectNotFound).is_access_denied());
        assert!(service_error(NotionErrorCode::RestrictedResource).is_access_denied());
        assert!(!service_error(NotionErrorCode::InternalError).is_access_denied());
        assert!(!AppError::MalformedResponse("x".into()).is_access_denied());
    }

    #[test]
    fn retry_after_is_exposed() {
        let err = AppError::NotionService {
            code: NotionErrorCode::RateLimited,
            message: "slow down".to_string(),
            status: 429,
            retry_after: Some(Duration::from_secs(3)),
        };
        assert!(err.is_retryable());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(3)));
    }
}
