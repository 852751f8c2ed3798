//! `zhiyuan serve` - Start the HTTP API server.

use std::sync::Arc;

use anyhow::Context;
use zhiyuan_config::AppConfig;
use zhiyuan_context::{ContextAssembler, PromptBudget};
use zhiyuan_gateway::AppState;
use zhiyuan_knowledge::KnowledgeStore;
use zhiyuan_providers::ArkClient;

pub async fn run(port_override: Option<u16>) -> anyhow::Result<()> {
    let mut config = AppConfig::load().context("Failed to load config")?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    let store = Arc::new(
        KnowledgeStore::open(&config.corpus.dir, &config.corpus.manifest)
            .context("Failed to open knowledge corpus")?,
    );

    let assembler = ContextAssembler::new(
        store.clone(),
        PromptBudget {
            max_tokens: config.prompt.max_prompt_tokens,
            max_search_hits: config.prompt.max_search_hits,
            max_history_turns: config.prompt.max_history_turns,
        },
    );

    let completion = Arc::new(ArkClient::from_config(&config)?);

    println!("志愿 Zhiyuan Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Corpus: {}", config.corpus.dir.display());
    println!("   Sections: {}", store.section_ids().len());

    zhiyuan_gateway::serve(&config.gateway, AppState::new(store, assembler, completion)).await?;

    Ok(())
}
