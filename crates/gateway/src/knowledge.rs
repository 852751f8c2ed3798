//! Read-only knowledge endpoints.
//!
//! Collaborator boundary for the catalog pages: section dumps and the flat
//! search, both straight off the knowledge store.

use axum::Json;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::warn;
use zhiyuan_core::error::CorpusError;

use crate::envelope::ApiEnvelope;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct KnowledgeQuery {
    /// Section id, or "all" for every section keyed by id.
    #[serde(rename = "type")]
    pub section_type: Option<String>,
}

/// `GET /api/v1/knowledge?type=<id|all>`
pub async fn get_knowledge_handler(
    State(state): State<SharedState>,
    Query(query): Query<KnowledgeQuery>,
) -> Response {
    let Some(section_type) = query.section_type.filter(|t| !t.is_empty()) else {
        return ApiEnvelope::rejected("缺少必要参数：type").into_response();
    };

    if section_type == "all" {
        let sections = state.store.load_all_sections().await;
        let mut data = serde_json::Map::new();
        for (id, section) in sections {
            data.insert(id, (*section).clone());
        }
        return ApiEnvelope::ok(serde_json::Value::Object(data)).into_response();
    }

    match state.store.load_section(&section_type).await {
        Ok(section) => ApiEnvelope::ok((*section).clone()).into_response(),
        Err(CorpusError::SectionNotFound(_)) => {
            ApiEnvelope::rejected("无效的知识库类型").into_response()
        }
        Err(e) => {
            warn!(section = %section_type, error = %e, "Section load failed");
            ApiEnvelope::failed(e.to_string()).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_max_results() -> usize {
    10
}

/// `POST /api/v1/knowledge/search`
pub async fn search_knowledge_handler(
    State(state): State<SharedState>,
    Json(payload): Json<SearchRequest>,
) -> Response {
    if payload.query.trim().is_empty() {
        return ApiEnvelope::rejected("缺少必要参数：query").into_response();
    }

    let mut results = state.store.search(&payload.query, None).await;
    results.truncate(payload.max_results);

    ApiEnvelope::ok(serde_json::json!({
        "query": payload.query,
        "count": results.len(),
        "results": results,
    }))
    .into_response()
}
