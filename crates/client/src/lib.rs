//! # Zhiyuan Client
//!
//! The client-side counterpart of the streaming gateway: a `StreamDecoder`
//! that reconstructs the exact fragment sequence from a growing response
//! buffer regardless of how the transport chunked it, and a `ChatClient`
//! that drives the chat endpoints.

pub mod decoder;
pub mod http;

pub use decoder::StreamDecoder;
pub use http::{ChatClient, StreamOutcome};
