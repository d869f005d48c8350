// src/output/writer.rs
//! Executes output operations by performing actual I/O.
//!
//! This module and the posted-cache are the only places that touch the
//! filesystem.

use super::types::*;
use crate::error::AppError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Delivers the output plan. A failing operation is recorded and the
/// remaining operations still run.
pub fn deliver(plan: OutputPlan) -> OutputReport {
    let mut report = OutputReport::default();

    log::debug!("Executing output plan with {} operations", plan.operations.len());

    for operation in plan.operations {
        match execute_operation(&operation) {
            Ok(bytes) => {
                report.bytes_written += bytes;
                report.completed.push(operation);
            }
            Err(e) => {
                log::error!("Could not {}: {}", operation.describe(), e);
                report.failed.push((operation, e.to_string()));
            }
        }
    }

    log::debug!(
        "Output plan complete: {} succeeded, {} failed",
        report.completed.len(),
        report.failed.len()
    );
    report
}

fn execute_operation(operation: &DeliveryTarget) -> Result<usize, AppError> {
    match operation {
        DeliveryTarget::WriteFile { path, content } => write_file(path, content),
        DeliveryTarget::AppendFile { path, content } => append_file(path, content),
        DeliveryTarget::PrintToStdout { content } => {
            print!("{}", content);
            std::io::stdout().flush()?;
            Ok(content.len())
        }
    }
}

fn create_parent(path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn write_file(path: &Path, content: &str) -> Result<usize, AppError> {
    create_parent(path)?;
    fs::write(path, content)?;
    log::info!("Wrote {}", path.display());
    Ok(content.len())
}

fn append_file(path: &Path, content: &str) -> Result<usize, AppError> {
    create_parent(path)?;
    let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(content.as_bytes())?;
    log::info!("Appended to {}", path.display());
    Ok(content.len())
}

/// Replaces `path` with `content` through a temporary sibling file and a
/// rename.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<(), AppError> {
    create_parent(path)?;
    let temp = temp_sibling(path);
    fs::write(&temp, content)?;
    if let Err(e) = fs::rename(&temp, path) {
        let _ = fs::remove_file(&temp);
        return Err(e.into());
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}
