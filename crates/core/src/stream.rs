//! Streamed delivery events and their wire encoding.
//!
//! `StreamEvent` is the unit the Stream Relay sends and the Stream Decoder
//! reconstructs. The wire format is the contract between the two and must
//! stay stable:
//!
//! - one record per line: `data: <json>` followed by a blank line
//! - a designated sentinel record, `data: [DONE]`, closes the stream in
//!   place of a payload
//! - `end` and `error` are terminal; anything after them belongs to no event

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Marker prefix every wire record starts with.
pub const RECORD_MARKER: &str = "data: ";

/// Sentinel payload marking end-of-stream in place of JSON.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Events delivered to the requesting client during a streamed answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Partial text fragment from the completion service.
    Chunk { content: String },

    /// The answer completed normally.
    End,

    /// The upstream failed mid-stream. Fragments already delivered remain
    /// valid; the answer may be incomplete.
    Error { message: String },
}

impl StreamEvent {
    /// Whether this event terminates the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::End | Self::Error { .. })
    }

    /// Encode this event as one self-delimited wire record.
    pub fn encode(&self) -> String {
        // StreamEvent serialization cannot fail: no non-string keys, no
        // non-finite numbers.
        let payload = serde_json::to_string(self).unwrap_or_default();
        format!("{RECORD_MARKER}{payload}\n\n")
    }

    /// Encode the end-of-stream sentinel record.
    pub fn encode_sentinel() -> String {
        format!("{RECORD_MARKER}{DONE_SENTINEL}\n\n")
    }

    /// Decode a single trimmed wire line into an event.
    ///
    /// Returns `Ok(None)` for the sentinel. Lines without the marker prefix
    /// and lines whose payload is not valid JSON are `ProtocolError`s; the
    /// caller skips them rather than failing the stream.
    pub fn decode_line(line: &str) -> Result<Option<StreamEvent>, ProtocolError> {
        let Some(payload) = line.strip_prefix(RECORD_MARKER) else {
            return Err(ProtocolError::MissingMarker(line.to_string()));
        };

        let payload = payload.trim();
        if payload == DONE_SENTINEL {
            return Ok(None);
        }

        serde_json::from_str(payload)
            .map(Some)
            .map_err(|e| ProtocolError::MalformedPayload(format!("{payload}: {e}")))
    }
}
