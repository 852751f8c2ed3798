//! # Zhiyuan Core
//!
//! Domain types, traits, and error definitions for the Zhiyuan admissions
//! assistant. This crate has **zero framework dependencies** - it defines
//! the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The upstream completion service is defined as a trait here; the HTTP
//! implementation lives in `zhiyuan-providers`. The streaming wire format is
//! defined here because it is the contract between the server-side relay and
//! every decoder implementation.

pub mod chat;
pub mod completion;
pub mod error;
pub mod stream;

// Re-export key types at crate root for ergonomics
pub use chat::{ChatRequest, ConversationTurn, Profile, Role};
pub use completion::{CompletionClient, Fragment, FragmentReceiver};
pub use error::{CorpusError, Error, ProtocolError, Result, UpstreamError, ValidationError};
pub use stream::{DONE_SENTINEL, RECORD_MARKER, StreamEvent};
