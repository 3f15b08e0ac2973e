use serde::{Deserialize, Serialize};

use super::Timestamp;

/// A Trading Post member and their hour-credit standing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier, server-assigned.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Sign-in email address.
    pub email: String,

    /// When the member joined.
    pub join_date: Timestamp,

    /// Current hour-credit balance.
    pub time_balance: f32,

    /// Skills the member lists on their profile.
    pub skills: Vec<String>,

    /// Optional profile bio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,

    /// Number of completed trades.
    pub completed_trades: u32,

    /// Average peer rating.
    pub rating: f32,
}

/// Request body for `POST /auth/signup`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Request body for `POST /auth/signin`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

/// Response body for signup and signin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthResponse {
    /// Bearer token for subsequent requests.
    pub token: String,
    /// The authenticated user.
    pub user: User,
}

/// Request body for `PUT /users/me`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
}
