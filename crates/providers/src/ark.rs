//! Ark (Volcengine) completion client.
//!
//! Works with any OpenAI-compatible `/chat/completions` endpoint; the
//! default configuration points at Ark. Supports single-shot completion and
//! incremental SSE delivery.
//!
//! Streaming rules:
//! - records arrive as `data: <json>` lines; the `[DONE]` sentinel ends the
//!   stream with no further fragments and no error
//! - a payload that does not parse is skipped with a diagnostic, never fatal
//! - a transport failure mid-stream ends the fragment sequence with one
//!   error; fragments already yielded stay valid
//! - dropping the fragment receiver cancels the reader task, which closes
//!   the upstream connection

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tracing::{debug, trace, warn};
use zhiyuan_config::AppConfig;
use zhiyuan_core::completion::{CompletionClient, FragmentReceiver};
use zhiyuan_core::error::UpstreamError;

use crate::sse::LineBuffer;

/// System persona sent with every request.
const SYSTEM_PROMPT: &str = "你是一个有帮助的高考AI助手";

/// An OpenAI-compatible completion client.
pub struct ArkClient {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    request_timeout: std::time::Duration,
    client: reqwest::Client,
}

impl ArkClient {
    /// Create a new client against an OpenAI-compatible base URL.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: "ark".into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            request_timeout: std::time::Duration::from_secs(120),
            client,
        }
    }

    /// Build a client from the application config.
    pub fn from_config(config: &AppConfig) -> Result<Self, UpstreamError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            UpstreamError::NotConfigured(
                "no API key: set ZHIYUAN_API_KEY or api_key in config.toml".into(),
            )
        })?;
        let mut client = Self::new(&config.api_url, api_key, &config.model);
        client.request_timeout = std::time::Duration::from_secs(config.request_timeout_secs);
        Ok(client)
    }

    fn request_body(&self, prompt: &str, stream: bool) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
            "stream": stream,
        })
    }

    async fn triage(response: reqwest::Response) -> Result<reqwest::Response, UpstreamError> {
        let status = response.status().as_u16();

        if status == 401 || status == 403 {
            return Err(UpstreamError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if !(200..300).contains(&status) {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Upstream returned error");
            return Err(UpstreamError::Api {
                status_code: status,
                message: error_body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl CompletionClient for ArkClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, prompt: &str) -> Result<String, UpstreamError> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!(client = %self.name, model = %self.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .timeout(self.request_timeout)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&self.request_body(prompt, false))
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        let response = Self::triage(response).await?;

        let api_response: ApiResponse =
            response.json().await.map_err(|e| UpstreamError::Api {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| UpstreamError::Api {
                status_code: 200,
                message: "No choices in response".into(),
            })?;

        Ok(choice.message.content.unwrap_or_default())
    }

    async fn stream(&self, prompt: &str) -> Result<FragmentReceiver, UpstreamError> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!(client = %self.name, model = %self.model, "Sending streaming request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&self.request_body(prompt, true))
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        let response = Self::triage(response).await?;

        let (tx, rx) = tokio::sync::mpsc::channel(64);
        let client_name = self.name.clone();

        // Read the SSE byte stream and forward content fragments. The task
        // ends when the receiver is dropped, which drops `response` and
        // closes the upstream connection.
        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut lines = LineBuffer::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(UpstreamError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                for line in lines.push(&bytes) {
                    // Skip blank lines and SSE comments
                    if line.is_empty() || line.starts_with(':') {
                        continue;
                    }

                    let Some(data) = line.strip_prefix("data: ") else {
                        continue;
                    };
                    let data = data.trim();

                    if data == "[DONE]" {
                        return; // normal completion; channel closes
                    }

                    match serde_json::from_str::<StreamResponse>(data) {
                        Ok(stream_resp) => {
                            let Some(choice) = stream_resp.choices.first() else {
                                continue;
                            };
                            if let Some(content) = &choice.delta.content
                                && !content.is_empty()
                                && tx.send(Ok(content.clone())).await.is_err()
                            {
                                return; // receiver dropped, cancel
                            }
                        }
                        Err(e) => {
                            trace!(
                                client = %client_name,
                                data = %data,
                                error = %e,
                                "Ignoring unparseable stream record"
                            );
                        }
                    }
                }
            }
            // Stream ended without [DONE]: treat as normal completion.
        });

        Ok(rx)
    }
}

// --- Upstream API types (internal) ---

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

/// A single SSE `data: {...}` record from a streaming response.
#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    #[serde(default)]
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_normalizes_base_url() {
        let client = ArkClient::new("https://ark.example.com/api/v3/", "sk-test", "ep-1");
        assert_eq!(client.base_url, "https://ark.example.com/api/v3");
        assert_eq!(client.name(), "ark");
    }

    #[test]
    fn from_config_requires_api_key() {
        let config = AppConfig::default();
        assert!(matches!(
            ArkClient::from_config(&config),
            Err(UpstreamError::NotConfigured(_))
        ));

        let config = AppConfig {
            api_key: Some("sk-test".into()),
            ..Default::default()
        };
        let client = ArkClient::from_config(&config).unwrap();
        assert_eq!(client.model, AppConfig::default().model);
    }

    #[test]
    fn request_body_carries_persona_and_prompt() {
        let client = ArkClient::new("https://ark.example.com", "sk", "ep-1");
        let body = client.request_body("报名时间？", true);
        assert_eq!(body["model"], "ep-1");
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], SYSTEM_PROMPT);
        assert_eq!(body["messages"][1]["content"], "报名时间？");
    }

    // --- SSE record parsing ---

    #[test]
    fn parse_stream_content_delta() {
        let data = r#"{"choices":[{"delta":{"content":"你好"},"finish_reason":null}]}"#;
        let parsed: StreamResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.choices[0].delta.content.as_deref(), Some("你好"));
    }

    #[test]
    fn parse_stream_finish_record() {
        let data = r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#;
        let parsed: StreamResponse = serde_json::from_str(data).unwrap();
        assert!(parsed.choices[0].delta.content.is_none());
        assert_eq!(parsed.choices[0].finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn parse_record_without_choices() {
        let parsed: StreamResponse = serde_json::from_str(r#"{"usage":{}}"#).unwrap();
        assert!(parsed.choices.is_empty());
    }

    #[test]
    fn truncated_record_fails_to_parse() {
        assert!(serde_json::from_str::<StreamResponse>(r#"{"choices":[{"de"#).is_err());
    }

    #[test]
    fn parse_non_streaming_response() {
        let data = r#"{"choices":[{"message":{"role":"assistant","content":"答案在此"}}]}"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("答案在此")
        );
    }
}
