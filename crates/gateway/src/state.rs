//! Shared gateway state.

use std::sync::Arc;

use zhiyuan_context::ContextAssembler;
use zhiyuan_core::completion::CompletionClient;
use zhiyuan_knowledge::KnowledgeStore;

/// Everything a handler needs: the knowledge store, the prompt assembler
/// built over it, and the upstream completion client.
pub struct AppState {
    pub store: Arc<KnowledgeStore>,
    pub assembler: ContextAssembler,
    pub completion: Arc<dyn CompletionClient>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(
        store: Arc<KnowledgeStore>,
        assembler: ContextAssembler,
        completion: Arc<dyn CompletionClient>,
    ) -> SharedState {
        Arc::new(Self {
            store,
            assembler,
            completion,
        })
    }
}
