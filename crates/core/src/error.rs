//! Error types for the Zhiyuan domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant. Nothing here is fatal to
//! the process: every failure is scoped to a single request.

use thiserror::Error;

/// The top-level error type for all Zhiyuan operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Request validation ---
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    // --- Knowledge corpus ---
    #[error("Corpus error: {0}")]
    Corpus(#[from] CorpusError),

    // --- Upstream completion service ---
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    // --- Streaming wire protocol ---
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// A request failed validation. Surfaced before any retrieval or upstream
/// call is attempted.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// A knowledge section failed to load. Callers must treat this as "no
/// knowledge available for this section", never as a request failure.
#[derive(Debug, Clone, Error)]
pub enum CorpusError {
    #[error("Section not listed in manifest: {0}")]
    SectionNotFound(String),

    #[error("Manifest unreadable at {path}: {reason}")]
    ManifestUnreadable { path: String, reason: String },

    #[error("Section file unreadable at {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("Section file malformed at {path}: {reason}")]
    Malformed { path: String, reason: String },
}

/// Transport or non-2xx failure from the completion service.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Upstream not configured: {0}")]
    NotConfigured(String),
}

/// A malformed or unrecognized streamed record. Recovered locally by
/// skipping the record; never surfaced to the caller.
#[derive(Debug, Clone, Error)]
pub enum ProtocolError {
    #[error("Unparseable record payload: {0}")]
    MalformedPayload(String),

    #[error("Record missing marker prefix: {0}")]
    MissingMarker(String),
}
