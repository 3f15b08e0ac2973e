use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Timestamp;

/// Longest message preview kept on a conversation, in characters.
pub const PREVIEW_LIMIT: usize = 50;

/// A durable thread of messages tied to one marketplace post and exactly two
/// participants.
///
/// Created once per (post, participant pair) by whichever participant makes
/// contact first; the service returns the existing conversation on repeat
/// creation attempts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Unique identifier, server-assigned and immutable.
    pub id: Uuid,

    /// The marketplace post this conversation is about.
    pub post_id: Uuid,

    /// Post title, snapshot at conversation-creation time.
    pub post_title: String,

    /// Post author's display name, snapshot at conversation-creation time.
    pub post_author: String,

    /// The two user identifiers taking part: the post author and the
    /// requester.
    pub participants: Vec<String>,

    /// Preview of the most recent message, at most [`PREVIEW_LIMIT`]
    /// characters plus an ellipsis marker.
    pub last_message: String,

    /// Timestamp of the most recent message, or the conversation-creation
    /// time while the conversation is empty.
    pub last_message_time: Timestamp,

    /// Messages in this conversation not yet seen by the current viewer.
    pub unread_count: u32,
}

impl Conversation {
    /// Builds the `last_message` preview for a message text: the text
    /// unchanged when it fits, otherwise the first [`PREVIEW_LIMIT`]
    /// characters followed by `...`.
    pub fn preview_for(text: &str) -> String {
        if text.chars().count() > PREVIEW_LIMIT {
            let mut preview: String = text.chars().take(PREVIEW_LIMIT).collect();
            preview.push_str("...");
            preview
        } else {
            text.to_string()
        }
    }
}

/// Request body for `POST /messages/conversations`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    /// The post the conversation is about.
    pub post_id: Uuid,
}
