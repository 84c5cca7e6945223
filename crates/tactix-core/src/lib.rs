//! Core analysis pipeline for Tactix.
//!
//! This crate owns image handling, prompt assembly, the outbound model
//! client, the request handler used by the server and the caller-side
//! conversation store.

pub mod client;
pub mod conversation;
pub mod error;
pub mod handler;
pub mod image;
pub mod prompt;

pub use client::{AnalysisClient, AnalysisSession, DEFAULT_TIMEOUT, GeminiProvider};
/// Provider seam and its request/error types.
pub use client::{ClientError, GenerateRequest, ModelProvider};
pub use conversation::ConversationStore;
pub use error::{AnalysisError, ValidationError};
pub use handler::{AnalysisHandler, ApiReply, HttpMethod, InputShape, ReplyBody, parse_request};
pub use image::{ImageError, ImageFile, MAX_IMAGE_BYTES};
pub use prompt::{PromptAssembler, translate_history};
