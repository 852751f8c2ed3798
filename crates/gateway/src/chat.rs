//! Chat handlers: the non-streaming envelope endpoint and the streaming
//! endpoint backed by the relay.
//!
//! Both validate the request before any retrieval or upstream call; a
//! missing question is rejected with an explicit envelope and no partial
//! output is ever produced for it.

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use std::convert::Infallible;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::{info, warn};
use zhiyuan_core::chat::ChatRequest;

use crate::envelope::ApiEnvelope;
use crate::relay::relay;
use crate::state::SharedState;

/// `POST /api/v1/chat` - whole-answer mode.
pub async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Response {
    let (question, profile, history) = match payload.validate() {
        Ok(parts) => parts,
        Err(e) => {
            info!(error = %e, "Rejecting chat request");
            return ApiEnvelope::rejected(format!("缺少必要参数：{}", field_of(&e)))
                .into_response();
        }
    };

    let context = state
        .assembler
        .build_context(&question, &profile, &history)
        .await;

    match state.completion.complete(&context.text).await {
        Ok(reply) => ApiEnvelope::ok(serde_json::json!({
            "reply": reply,
            "searchResultsCount": context.stats.search_hits,
            "hasContextInfo": !context.stats.triggered_sections.is_empty(),
        }))
        .into_response(),
        Err(e) => {
            warn!(error = %e, "Completion failed");
            ApiEnvelope::failed(e.to_string()).into_response()
        }
    }
}

/// `POST /api/v1/chat/stream` - incremental delivery mode.
///
/// On success the response body is a chunked stream of wire records, one
/// flush per record. Failures before the first fragment (validation, the
/// upstream refusing the request) come back as plain JSON envelopes; a
/// failure after streaming has begun becomes a terminal `error` record.
pub async fn chat_stream_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Response {
    let (question, profile, history) = match payload.validate() {
        Ok(parts) => parts,
        Err(e) => {
            info!(error = %e, "Rejecting stream request");
            return ApiEnvelope::rejected(format!("缺少必要参数：{}", field_of(&e)))
                .into_response();
        }
    };

    let context = state
        .assembler
        .build_context(&question, &profile, &history)
        .await;

    let fragments = match state.completion.stream(&context.text).await {
        Ok(rx) => rx,
        Err(e) => {
            warn!(error = %e, "Upstream refused streaming request");
            return ApiEnvelope::failed(e.to_string()).into_response();
        }
    };

    // One sink send per record; each becomes its own body frame, so records
    // reach the client as they are produced. Dropping the body (client
    // disconnect) closes the sink, which stops the relay and cancels the
    // upstream call.
    let (sink, records) = tokio::sync::mpsc::channel::<Bytes>(16);
    tokio::spawn(async move {
        let outcome = relay(fragments, sink).await;
        info!(?outcome, "Stream relay finished");
    });

    let body = Body::from_stream(ReceiverStream::new(records).map(Ok::<_, Infallible>));
    Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(body)
        .unwrap_or_else(|_| ApiEnvelope::failed("response build error").into_response())
}

fn field_of(e: &zhiyuan_core::error::ValidationError) -> &'static str {
    match e {
        zhiyuan_core::error::ValidationError::MissingField(field) => field,
        zhiyuan_core::error::ValidationError::InvalidField { field, .. } => field,
    }
}
