//! # Chat DTOs
//!
//! Bodies for the send-message endpoints and the events of the streaming relay.
//!
//! The stream endpoint emits one JSON object per SSE `data:` line:
//!
//! ```text
//! data: {"type":"user_message","message":{"id":"...","role":"user","content":"hello"}}
//! data: {"type":"chunk","content":"Hel"}
//! data: {"type":"chunk","content":"lo!"}
//! data: {"type":"done","message":{"id":"...","role":"assistant","content":"Hello!"}}
//! ```
//!
//! A failed relay ends with `{"type":"error","error":"..."}` instead of `done`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use lib_utils::validate_length;

use super::{invalid, parse_id, Validate};
use crate::error::Result;
use crate::model::store::{Message, MessageRole};

pub const MAX_MESSAGE_LEN: usize = 5000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub conversation_id: String,
    pub message: String,
}

impl Validate for SendMessageRequest {
    fn validate(self) -> Result<Self> {
        let conversation_id = parse_id(&self.conversation_id, "conversation")?.to_string();

        let message = self.message.trim();
        validate_length(message, 1, MAX_MESSAGE_LEN, "Message").map_err(invalid)?;

        Ok(Self {
            conversation_id,
            message: message.to_string(),
        })
    }
}

/// A persisted message as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageInfo {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for MessageInfo {
    fn from(m: &Message) -> Self {
        Self {
            id: m.id.clone(),
            role: m.role,
            content: m.content.clone(),
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub user_message: MessageInfo,
    pub assistant_message: MessageInfo,
}

/// Message as carried inside stream events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct StreamMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
}

impl From<&Message> for StreamMessage {
    fn from(m: &Message) -> Self {
        Self {
            id: m.id.clone(),
            role: m.role,
            content: m.content.clone(),
        }
    }
}

/// One event of the streaming relay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    UserMessage { message: StreamMessage },
    Chunk { content: String },
    Done { message: StreamMessage },
    Error { error: String },
}
