//! Chat request value objects.
//!
//! These flow through the whole pipeline: the gateway deserializes an
//! inbound request, the assembler turns it into a prompt, the completion
//! client carries the prompt upstream. The server holds no conversation
//! state; callers resend their history on every request.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The role of a turn in a caller-supplied conversation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
}

/// A single prior turn, accumulated by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Caller-supplied profile attributes folded into the prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    /// Province the caller registers in, e.g. "北京".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,

    /// Exam track, e.g. "理科" / "文科".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Total exam score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,

    /// Interest tags used for major matching, e.g. "理工".
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interests: Vec<String>,

    /// Free-form extra attributes (school province, name, ...).
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub user_info: serde_json::Map<String, serde_json::Value>,
}

/// The chat request, shared by the streaming and non-streaming endpoints
/// (and by the client that sends it).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The question to answer. Required; rejected before any retrieval or
    /// upstream call when missing or blank.
    #[serde(default)]
    pub question: String,

    #[serde(default)]
    pub province: Option<String>,

    #[serde(default)]
    pub subject: Option<String>,

    #[serde(default)]
    pub score: Option<u32>,

    #[serde(default)]
    pub user_info: Option<serde_json::Map<String, serde_json::Value>>,

    #[serde(default)]
    pub interests: Vec<String>,

    #[serde(default)]
    pub conversation_history: Vec<ConversationTurn>,
}

impl ChatRequest {
    /// Validate the request and split it into question, profile and history.
    pub fn validate(self) -> Result<(String, Profile, Vec<ConversationTurn>), ValidationError> {
        if self.question.trim().is_empty() {
            return Err(ValidationError::MissingField("question"));
        }

        let profile = Profile {
            province: self.province,
            subject: self.subject,
            score: self.score,
            interests: self.interests,
            user_info: self.user_info.unwrap_or_default(),
        };

        Ok((self.question, profile, self.conversation_history))
    }
}
