//! `zhiyuan consult` - Generate a personalized registration plan locally.

use anyhow::Context;
use zhiyuan_config::AppConfig;
use zhiyuan_gateway::plan::generate_plan;
use zhiyuan_knowledge::KnowledgeStore;

pub async fn run(province: String, interests: Vec<String>) -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;
    let store = KnowledgeStore::open(&config.corpus.dir, &config.corpus.manifest)
        .context("Failed to open knowledge corpus")?;

    let mut user_info = serde_json::Map::new();
    user_info.insert("province".into(), serde_json::Value::String(province.clone()));

    let plan = generate_plan(&store, &province, &user_info, &interests).await;
    println!("{plan}");

    Ok(())
}
