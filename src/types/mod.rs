//! Validated domain newtypes shared by every layer.

use thiserror::Error;

mod domain_types;
mod ids;

pub use domain_types::*;
pub use ids::*;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid Notion ID format: {0}")]
    InvalidId(String),

    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Empty required field: {0}")]
    EmptyField(&'static str),

    #[error("Invalid API key format: {reason}")]
    InvalidApiKey { reason: String },

    #[error("Invalid Slack token format: {reason}")]
    InvalidSlackToken { reason: String },

    #[error("Invalid threshold '{value}': {reason}")]
    InvalidThreshold { value: String, reason: String },
}
