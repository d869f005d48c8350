// src/slack/memory.rs
//! A relay that keeps messages in memory.

use super::{ChatMessage, ChatRelay};
use crate::error::AppError;
use std::collections::HashSet;
use std::sync::Mutex;

/// Records posted messages. Selected posts (0-based, counting attempts)
/// can be made to fail.
#[derive(Debug, Default)]
pub struct RecordingRelay {
    posted: Mutex<Vec<ChatMessage>>,
    attempts: Mutex<usize>,
    failing: HashSet<usize>,
}

impl RecordingRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, attempt: usize) -> Self {
        self.failing.insert(attempt);
        self
    }

    /// Messages accepted so far, oldest first.
    pub fn posted(&self) -> Vec<ChatMessage> {
        self.posted.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ChatRelay for RecordingRelay {
    async fn post(&self, message: &ChatMessage) -> Result<(), AppError> {
        let attempt = {
            let mut attempts = self
                .attempts
                .lock()
                .map_err(|_| AppError::MalformedResponse("relay state poisoned".into()))?;
            *attempts += 1;
            *attempts - 1
        };
        if self.failing.contains(&attempt) {
            return Err(AppError::SlackDelivery {
                status: Some(500),
                message: format!("post {} rejected", attempt),
            });
        }
        if let Ok(mut posted) = self.posted.lock() {
            posted.push(message.clone());
        }
        Ok(())
    }
}
