//! Test helpers shared across Tactix crates.

pub mod llm;

pub use llm::{FailingModel, FixedModel, PendingModel, RecordingModel};
