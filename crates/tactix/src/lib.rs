//! Public SDK surface for Tactix.
//!
//! This crate re-exports the core building blocks, provides the transports
//! and chat session used by clients, and a small initialization helper to
//! keep consumer setup consistent.

pub mod chat;
pub mod remote;

/// Re-export for convenience.
pub use tactix_config as config;
pub use tactix_core as core;
/// Re-export for convenience.
pub use tactix_protocol as protocol;

pub use chat::{ChatError, ChatSession, PendingImage};
pub use remote::{AnalyzeTransport, DEFAULT_ENDPOINT, LocalAnalyzer, RemoteAnalyzer, RemoteError};

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Binaries are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::builder()
            .format_timestamp_millis()
            .parse_default_env()
            .try_init();
    }
}
