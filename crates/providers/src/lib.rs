//! # Zhiyuan Providers
//!
//! Implementations of the `CompletionClient` trait. Currently one backend:
//! the Ark (Volcengine) OpenAI-compatible endpoint, in single-shot and
//! incremental SSE modes.

pub mod ark;
pub mod sse;

pub use ark::ArkClient;
pub use sse::LineBuffer;
