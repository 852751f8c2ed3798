//! # Zhiyuan Gateway
//!
//! The HTTP API:
//!
//! - `POST /api/v1/chat`             - whole-answer chat (JSON envelope)
//! - `POST /api/v1/chat/stream`      - incremental chat (wire records)
//! - `GET  /api/v1/knowledge`        - section dump (`?type=<id|all>`)
//! - `POST /api/v1/knowledge/search` - flat corpus search
//! - `POST /api/v1/gaokao/consult`   - personalized registration plan
//! - `GET  /api/v1/gaokao/provinces` - province list
//!
//! One logical request is one sequential pipeline: assembler, completion
//! client, relay. The knowledge store is the only shared state.

pub mod chat;
pub mod envelope;
pub mod knowledge;
pub mod plan;
pub mod relay;
pub mod state;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use zhiyuan_config::GatewayConfig;

pub use envelope::ApiEnvelope;
pub use relay::{RelayOutcome, relay};
pub use state::{AppState, SharedState};

/// Build the `/api/v1` router.
pub fn api_router(state: SharedState) -> Router {
    Router::new()
        .route("/chat", post(chat::chat_handler))
        .route("/chat/stream", post(chat::chat_stream_handler))
        .route("/knowledge", get(knowledge::get_knowledge_handler))
        .route("/knowledge/search", post(knowledge::search_knowledge_handler))
        .route("/gaokao/consult", post(plan::consult_handler))
        .route("/gaokao/provinces", get(plan::provinces_handler))
        .with_state(state)
}

/// Build the full application router with CORS and request tracing.
pub fn app(state: SharedState) -> Router {
    Router::new()
        .nest("/api/v1", api_router(state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: &GatewayConfig, state: SharedState) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Gateway listening");
    axum::serve(listener, app(state)).await
}
