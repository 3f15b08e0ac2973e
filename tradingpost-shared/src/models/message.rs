use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Timestamp;

/// A single message inside a conversation.
///
/// Canonical state lives on the Trading Post service: `id` and `timestamp`
/// are server-assigned, and `timestamp` is strictly increasing within a
/// conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique identifier for the message.
    pub id: Uuid,

    /// The conversation this message belongs to.
    pub conversation_id: Uuid,

    /// Identifier of the user who wrote the message.
    pub sender_id: String,

    /// Display name of the sender, snapshot at send time.
    pub sender_name: String,

    /// The message content.
    pub text: String,

    /// Server-assigned creation time.
    pub timestamp: Timestamp,

    /// Whether the recipient has seen this message.
    pub read: bool,
}

/// Request body for `POST /messages/conversations/{id}/messages`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SendMessageRequest {
    /// The content to send.
    pub text: String,
}
