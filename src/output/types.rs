// src/output/types.rs
//! Type definitions for output operations.

use std::path::PathBuf;

/// The local writes a run wants to make, in order.
#[derive(Debug, Clone, Default)]
pub struct OutputPlan {
    pub operations: Vec<DeliveryTarget>,
}

impl OutputPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_operation(mut self, operation: DeliveryTarget) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// A single output operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryTarget {
    /// Write content to a file, creating parent directories.
    WriteFile { path: PathBuf, content: String },
    /// Append content to a file (CI step summaries are shared files).
    AppendFile { path: PathBuf, content: String },
    PrintToStdout { content: String },
}

impl DeliveryTarget {
    pub fn describe(&self) -> String {
        match self {
            DeliveryTarget::WriteFile { path, .. } => format!("write {}", path.display()),
            DeliveryTarget::AppendFile { path, .. } => format!("append to {}", path.display()),
            DeliveryTarget::PrintToStdout { .. } => "print to stdout".to_string(),
        }
    }
}

/// Result of executing an output plan.
#[derive(Debug, Clone, Default)]
pub struct OutputReport {
    pub completed: Vec<DeliveryTarget>,
    /// Failed operations with their error messages.
    pub failed: Vec<(DeliveryTarget, String)>,
    pub bytes_written: usize,
}

impl OutputReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}
