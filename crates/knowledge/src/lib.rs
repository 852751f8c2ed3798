//! # Zhiyuan Knowledge
//!
//! The knowledge store: loads named sections of the structured corpus,
//! caches them per section for the process lifetime, and offers a generic
//! flat-key substring search across all loaded sections.
//!
//! Each store owns its own cache; tests construct throwaway stores over
//! fixture corpora, and the running service holds exactly one store.

pub mod manifest;
pub mod search;
pub mod store;

pub use manifest::{Manifest, SectionEntry};
pub use search::{SearchHit, search_section};
pub use store::{KnowledgeStore, Section};
