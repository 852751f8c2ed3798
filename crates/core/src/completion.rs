//! CompletionClient trait - the abstraction over the upstream LLM endpoint.
//!
//! A CompletionClient knows how to send a rendered prompt to the completion
//! service and get text back, either as one string or as a stream of
//! fragments. The gateway calls `complete()` or `stream()` without knowing
//! which backend is configured.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::UpstreamError;

/// One incrementally delivered piece of generated text.
pub type Fragment = String;

/// Receiver side of a streaming completion.
///
/// Yields `Ok(fragment)` for each piece of text and ends when the upstream
/// signals completion. A transport failure mid-stream ends the sequence with
/// one `Err`; fragments already yielded remain valid and the caller must not
/// discard them, only flag the answer as possibly incomplete.
pub type FragmentReceiver = mpsc::Receiver<std::result::Result<Fragment, UpstreamError>>;

/// The upstream completion service.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// A human-readable name for this backend (e.g. "ark").
    fn name(&self) -> &str;

    /// Send a prompt and block until the full generated text is available.
    async fn complete(&self, prompt: &str) -> std::result::Result<String, UpstreamError>;

    /// Send a prompt with incremental delivery enabled.
    ///
    /// Dropping the receiver cancels the request; implementations must close
    /// the upstream connection promptly when that happens.
    async fn stream(&self, prompt: &str) -> std::result::Result<FragmentReceiver, UpstreamError>;
}
