//! Wire contracts for the assistant stream.
//!
//! Inbound frames are JSON objects discriminated by a `type` field;
//! payload fields sit flat beside the tag. Outbound, the client sends a
//! single request shape carrying the user id, the raw message, and the
//! prompt turns (system context plus recent history).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("invalid frame json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame is structurally unusable")]
    Unusable,
}

/// One inbound protocol frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Status {
        content: String,
    },
    Warning {
        content: String,
    },
    Chunk {
        content: String,
    },
    Complete {
        /// The server echoes the full response here; the client trusts
        /// its own accumulated buffer instead.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
    SqlResult {
        query: String,
        result: SqlOutcome,
    },
    GenerationMetrics {
        metrics: GenerationMetrics,
    },
    Error {
        content: String,
    },
    SqlError {
        query: String,
        error: String,
    },
    Hold {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
    ReleaseHold {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
}

/// Outcome of executing the generated SQL, as reported by the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SqlOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<serde_json::Map<String, Value>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_rows: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenerationMetrics {
    pub session: SessionMetrics,
    pub overall: OverallMetrics,
}

/// Token-generation timings for the just-finished response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionMetrics {
    #[serde(default)]
    pub tokens: u64,
    #[serde(default)]
    pub total_time: f64,
    #[serde(default)]
    pub avg_time_per_token: f64,
    #[serde(default)]
    pub tokens_per_second: f64,
    #[serde(default)]
    pub ttft: Option<f64>,
    #[serde(default)]
    pub avg_inter_token_time: f64,
    #[serde(default)]
    pub median_inter_token_time: f64,
}

/// Cumulative token-generation timings across the server's lifetime.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OverallMetrics {
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default)]
    pub total_time: f64,
    #[serde(default)]
    pub avg_time_per_token: f64,
    #[serde(default)]
    pub tokens_per_second: f64,
    #[serde(default)]
    pub rolling_avg_session_time: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

/// The request payload sent for each user query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryRequest {
    pub user_id: String,
    pub message: String,
    pub messages: Vec<ChatTurn>,
}

impl QueryRequest {
    pub fn encode(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A decoded inbound payload. Frames the client does not recognize fall
/// back to plain assistant text when a `content` string is recoverable.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Frame(ServerFrame),
    /// Legacy or unrecognized payload, surfaced as plain assistant text.
    Legacy(String),
}

/// Strict decoder: the frame must match a known `type`.
pub fn decode_frame(text: &str) -> Result<ServerFrame, WireError> {
    Ok(serde_json::from_str(text)?)
}

/// Lenient decoder. Unknown frame types degrade to [`Inbound::Legacy`];
/// only structurally unusable payloads (no recoverable text at all)
/// return an error. Never panics.
pub fn decode_inbound(text: &str) -> Result<Inbound, WireError> {
    if let Ok(frame) = serde_json::from_str::<ServerFrame>(text) {
        return Ok(Inbound::Frame(frame));
    }
    let value: Value = serde_json::from_str(text)?;
    match value {
        Value::String(content) => Ok(Inbound::Legacy(content)),
        Value::Object(map) => match map.get("content") {
            Some(Value::String(content)) => Ok(Inbound::Legacy(content.clone())),
            _ => Err(WireError::Unusable),
        },
        _ => Err(WireError::Unusable),
    }
}
