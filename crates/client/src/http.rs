//! HTTP chat client.
//!
//! Drives the gateway's chat endpoints: the non-streaming envelope call and
//! the streaming call, feeding response bytes through the `StreamDecoder`
//! and handing fragments to the caller as they arrive.

use futures::StreamExt;
use serde::Deserialize;
use tracing::debug;
use zhiyuan_core::chat::ChatRequest;
use zhiyuan_core::error::{Error, UpstreamError};
use zhiyuan_core::stream::StreamEvent;

use crate::decoder::StreamDecoder;

/// How a streamed answer ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The full answer arrived.
    Completed,
    /// The server reported a failure mid-stream; fragments already handed to
    /// the caller remain valid but the answer may be incomplete.
    Failed { message: String },
}

/// The gateway's non-streaming response envelope.
#[derive(Debug, Deserialize)]
struct Envelope {
    code: u16,
    message: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// Client for the Zhiyuan gateway.
pub struct ChatClient {
    base_url: String,
    http: reqwest::Client,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Ask a question and wait for the whole reply.
    pub async fn ask(&self, request: &ChatRequest) -> Result<String, Error> {
        let url = format!("{}/api/v1/chat", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        if envelope.code != 200 {
            return Err(Error::Internal(format!(
                "{}: {}",
                envelope.code, envelope.message
            )));
        }

        let reply = envelope
            .data
            .as_ref()
            .and_then(|d| d.get("reply"))
            .and_then(|r| r.as_str())
            .unwrap_or_default()
            .to_string();
        Ok(reply)
    }

    /// Ask a question with incremental delivery.
    ///
    /// `on_fragment` is invoked for every text fragment in arrival order.
    /// Returns how the stream ended; on `Failed`, fragments already
    /// delivered are kept and the caller should flag the answer as possibly
    /// incomplete rather than discard it.
    pub async fn ask_stream(
        &self,
        request: &ChatRequest,
        mut on_fragment: impl FnMut(&str),
    ) -> Result<StreamOutcome, Error> {
        let url = format!("{}/api/v1/chat/stream", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Api {
                status_code: status,
                message: body,
            }
            .into());
        }

        let mut bytes = response.bytes_stream();
        let mut buffer = String::new();
        let mut partial: Vec<u8> = Vec::new();
        let mut decoder = StreamDecoder::new();

        while let Some(chunk) = bytes.next().await {
            let chunk = chunk.map_err(|e| UpstreamError::StreamInterrupted(e.to_string()))?;

            // Reassemble UTF-8 across arbitrary chunk boundaries: only the
            // valid prefix moves into the text buffer, the rest waits.
            partial.extend_from_slice(&chunk);
            let valid_up_to = match std::str::from_utf8(&partial) {
                Ok(_) => partial.len(),
                Err(e) => e.valid_up_to(),
            };
            if valid_up_to > 0 {
                buffer.push_str(
                    std::str::from_utf8(&partial[..valid_up_to])
                        .unwrap_or_default(),
                );
                partial.drain(..valid_up_to);
            }

            for event in decoder.feed(&buffer) {
                match event {
                    StreamEvent::Chunk { content } => on_fragment(&content),
                    StreamEvent::End => {
                        debug!("Stream completed");
                        return Ok(StreamOutcome::Completed);
                    }
                    StreamEvent::Error { message } => {
                        debug!(%message, "Stream failed mid-answer");
                        return Ok(StreamOutcome::Failed { message });
                    }
                }
            }
            if decoder.is_finished() {
                return Ok(StreamOutcome::Completed);
            }
        }

        // Connection closed without a terminal record.
        Err(UpstreamError::StreamInterrupted("connection closed before the stream ended".into()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_parses_success_shape() {
        let envelope: Envelope = serde_json::from_str(
            r#"{"code": 200, "message": "操作成功", "data": {"reply": "答案"}}"#,
        )
        .unwrap();
        assert_eq!(envelope.code, 200);
        assert_eq!(envelope.data.unwrap()["reply"], "答案");
    }

    #[test]
    fn envelope_parses_rejection_shape() {
        let envelope: Envelope = serde_json::from_str(
            r#"{"code": 400, "message": "缺少必要参数：question", "data": null}"#,
        )
        .unwrap();
        assert_eq!(envelope.code, 400);
        assert!(envelope.message.contains("question"));
    }

    #[test]
    fn base_url_is_normalized() {
        let client = ChatClient::new("http://localhost:3000/");
        assert_eq!(client.base_url, "http://localhost:3000");
    }
}
