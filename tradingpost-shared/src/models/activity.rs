use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Timestamp;

/// What kind of community event an [`ActivityItem`] records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// A member published a new post.
    PostCreated,
    /// Two members connected over a post.
    ConnectionMade,
}

/// One entry in the community activity feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItem {
    /// Unique identifier, server-assigned.
    pub id: Uuid,

    /// The kind of event.
    #[serde(rename = "type")]
    pub kind: ActivityKind,

    /// The member who triggered the event.
    pub user_id: String,

    /// Display name of that member.
    pub user_name: String,

    /// The post involved, when the event concerns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<Uuid>,

    /// Title of that post.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_title: Option<String>,

    /// The other member, for connection events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_user: Option<String>,

    /// When the event happened.
    pub timestamp: Timestamp,
}
