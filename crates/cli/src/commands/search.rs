//! `zhiyuan search` - Search the local knowledge corpus.

use anyhow::Context;
use zhiyuan_config::AppConfig;
use zhiyuan_knowledge::KnowledgeStore;

pub async fn run(query: String, max_results: usize) -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;
    let store = KnowledgeStore::open(&config.corpus.dir, &config.corpus.manifest)
        .context("Failed to open knowledge corpus")?;

    let mut hits = store.search(&query, None).await;
    let total = hits.len();
    hits.truncate(max_results);

    if hits.is_empty() {
        println!("没有找到与「{query}」相关的内容");
        return Ok(());
    }

    println!("「{query}」命中 {total} 条（显示 {} 条）:", hits.len());
    for hit in hits {
        println!("  [{}] {} = {}", hit.section_id, hit.path, hit.value);
    }

    Ok(())
}
