use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

use super::Timestamp;

/// Whether a post offers time or requests it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    /// The author is offering a service.
    Offer,
    /// The author is asking for a service.
    Request,
}

impl Display for PostKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            PostKind::Offer => write!(f, "offer"),
            PostKind::Request => write!(f, "request"),
        }
    }
}

/// A marketplace post: an offer of or request for service hours.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Unique identifier, server-assigned.
    pub id: Uuid,

    /// Display name of the post author.
    pub author: String,

    /// Short headline shown on the bulletin board.
    pub title: String,

    /// Full description of the offered or requested service.
    pub description: String,

    /// Hour-credit value of the service.
    pub hours: f32,

    /// Offer or request.
    #[serde(rename = "type")]
    pub kind: PostKind,

    /// Marketplace category, e.g. "Gardening" or "Education".
    pub category: String,

    /// Creation time.
    pub date: Timestamp,

    /// Free-form search tags.
    pub tags: Vec<String>,

    /// Whether the post is still open.
    pub active: bool,
}

/// Request body for `POST /posts`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub description: String,
    pub hours: f32,
    #[serde(rename = "type")]
    pub kind: PostKind,
    pub category: String,
    pub tags: Vec<String>,
}

/// Request body for `PUT /posts/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}
