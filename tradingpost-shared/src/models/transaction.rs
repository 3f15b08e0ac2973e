use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Timestamp;

/// A settled or pending hour-credit transfer between two members.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Unique identifier, server-assigned.
    pub id: Uuid,

    /// The post the trade settles.
    pub post_id: Uuid,

    /// The member providing the service.
    pub provider_id: String,

    /// The member receiving the service.
    pub receiver_id: String,

    /// Hour credits transferred.
    pub hours: f32,

    /// Whether both parties have confirmed the trade.
    pub confirmed: bool,

    /// When the transaction was opened.
    pub created_at: Timestamp,
}

/// Request body for `POST /transactions`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub post_id: Uuid,
    pub provider_id: String,
    pub receiver_id: String,
    pub hours: f32,
}
