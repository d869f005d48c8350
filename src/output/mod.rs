// src/output/mod.rs
//! Local output with planning separated from execution.
//!
//! Report builders return content; the pipelines describe where it goes as
//! an [`OutputPlan`] and [`deliver`] performs the writes.

mod types;
mod writer;

pub use types::{DeliveryTarget, OutputPlan, OutputReport};
pub use writer::{deliver, write_atomic};
