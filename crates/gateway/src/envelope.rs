//! The JSON response envelope.
//!
//! Every non-streaming endpoint answers `{code, message, data}`; the HTTP
//! status stays 200 and the envelope `code` carries the outcome. This is the
//! contract the original web client consumes.

use axum::Json;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct ApiEnvelope {
    pub code: u16,
    pub message: String,
    pub data: Value,
}

impl ApiEnvelope {
    /// `{code: 200, message: "操作成功", data}`
    pub fn ok(data: Value) -> Json<Self> {
        Json(Self {
            code: 200,
            message: "操作成功".into(),
            data,
        })
    }

    /// A validation rejection, surfaced before any work is done.
    pub fn rejected(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            code: 400,
            message: message.into(),
            data: Value::Null,
        })
    }

    /// A server-side failure scoped to this request.
    pub fn failed(error: impl Into<String>) -> Json<Self> {
        Json(Self {
            code: 500,
            message: "服务器内部错误".into(),
            data: serde_json::json!({ "error": error.into() }),
        })
    }
}
