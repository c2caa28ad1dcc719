//! HTTP API response DTOs for the polling application.

use serde::{Deserialize, Serialize};

use crate::domain::ChatMessage;

use super::websocket::PollDto;

/// Active poll with its remaining time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivePollDto {
    pub poll: PollDto,
    pub remaining_time: u32,
}

/// Stored chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageDto {
    pub poll_id: String,
    pub session_id: String,
    pub from: String,
    pub text: String,
    pub timestamp: i64,
    pub sent_at: String, // ISO 8601
}

impl From<&ChatMessage> for ChatMessageDto {
    fn from(m: &ChatMessage) -> Self {
        Self {
            poll_id: m.scope.as_str().to_string(),
            session_id: m.session_id.as_str().to_string(),
            from: m.from.as_str().to_string(),
            text: m.text.as_str().to_string(),
            timestamp: m.timestamp.value(),
            sent_at: kyoshitsu_shared::time::timestamp_to_jst_rfc3339(m.timestamp.value()),
        }
    }
}

/// Error body for non-2xx responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponseDto {
    pub message: String,
}
