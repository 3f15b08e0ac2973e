//! Typed HTTP transport for the Trading Post service.
//!
//! [`ApiClient`] is a thin request wrapper: it attaches the bearer token
//! when one is configured, (de)serializes JSON bodies, and folds every
//! failure into [`ApiError`]. It never retries and never caches — retry
//! policy and state belong to the callers (the stores).

use std::sync::RwLock;
use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::config::ClientConfig;
use shared::models::{
    ActivityItem, AuthResponse, Conversation, CreateConversationRequest, CreatePostRequest,
    CreateTransactionRequest, ErrorResponse, Message, Post, PostKind, SendMessageRequest,
    SigninRequest, SignupRequest, Transaction, UpdatePostRequest, UpdateUserRequest, User,
};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

/// Fallback when the service answers with a non-success status and no
/// parseable error body.
const GENERIC_FAILURE: &str = "Request failed";

/// Result alias for transport operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// The single error surface of the transport layer.
///
/// `Clone` on purpose: stores record the most recent error while also
/// re-raising it to the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The service could not be reached at all.
    #[error("network error: {message}")]
    Network {
        /// Human-readable description of the transport failure.
        message: String,
    },

    /// The service answered with a non-success status.
    #[error("request failed with status {status}: {message}")]
    Http {
        /// The HTTP status code.
        status: u16,
        /// The service's error message, or a generic fallback.
        message: String,
    },

    /// The service answered successfully but the body did not parse.
    #[error("malformed response: {message}")]
    Parse {
        /// Human-readable description of the decode failure.
        message: String,
    },
}

impl ApiError {
    /// The HTTP status code, for [`ApiError::Http`] values.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Parse {
                message: err.to_string(),
            }
        } else {
            ApiError::Network {
                message: err.to_string(),
            }
        }
    }
}

/// Lightweight API client for Trading Post service interactions.
#[derive(Debug)]
pub struct ApiClient {
    base_url: Url,
    client: Client,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    /// Create a new API client from the resolved configuration.
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent("tradingpost-client")
            .build()
            .map_err(ApiError::from)?;

        Ok(Self {
            base_url: config.api_base_url.clone(),
            client,
            token: RwLock::new(None),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Replace the bearer token used for subsequent requests. `None` makes
    /// calls go out unauthenticated.
    pub fn set_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.token.write() {
            *guard = token;
        }
    }

    /// The bearer token currently attached to requests, if any.
    pub fn current_token(&self) -> Option<String> {
        self.token
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().cloned())
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        if let Some(token) = self.current_token() {
            request.bearer_auth(token)
        } else {
            request
        }
    }

    /// Dispatch a request and map every failure mode into [`ApiError`]:
    /// transport failures become `Network`, non-success statuses become
    /// `Http` carrying the service's error message when one is parseable.
    async fn execute(&self, request: RequestBuilder) -> ApiResult<reqwest::Response> {
        let response = self.apply_auth(request).send().await.map_err(|err| {
            ApiError::Network {
                message: err.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .map(|body| body.to_string())
                .unwrap_or_else(|_| GENERIC_FAILURE.to_string());
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
        response.json().await.map_err(|err| ApiError::Parse {
            message: err.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        tracing::debug!(%path, "GET");
        let response = self.execute(self.client.get(self.api_url(path))).await?;
        Self::decode(response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        tracing::debug!(%path, "POST");
        let response = self
            .execute(self.client.post(self.api_url(path)).json(body))
            .await?;
        Self::decode(response).await
    }

    async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        tracing::debug!(%path, "PUT");
        let response = self
            .execute(self.client.put(self.api_url(path)).json(body))
            .await?;
        Self::decode(response).await
    }

    // --- Auth ---

    /// Register a new member.
    pub async fn signup(&self, request: &SignupRequest) -> ApiResult<AuthResponse> {
        self.post_json("/auth/signup", request).await
    }

    /// Sign an existing member in.
    pub async fn signin(&self, request: &SigninRequest) -> ApiResult<AuthResponse> {
        self.post_json("/auth/signin", request).await
    }

    // --- Users ---

    /// The profile behind the current token.
    pub async fn me(&self) -> ApiResult<User> {
        self.get_json("/users/me").await
    }

    /// Update the current member's profile.
    pub async fn update_me(&self, request: &UpdateUserRequest) -> ApiResult<User> {
        self.put_json("/users/me", request).await
    }

    /// Fetch a member by identifier.
    pub async fn user(&self, id: &str) -> ApiResult<User> {
        self.get_json(&format!("/users/{id}")).await
    }

    /// Fetch all members.
    pub async fn users(&self) -> ApiResult<Vec<User>> {
        self.get_json("/users").await
    }

    // --- Posts ---

    /// Publish a new post.
    pub async fn create_post(&self, request: &CreatePostRequest) -> ApiResult<Post> {
        self.post_json("/posts", request).await
    }

    /// Fetch posts, optionally restricted to offers or requests.
    pub async fn posts(&self, kind: Option<PostKind>) -> ApiResult<Vec<Post>> {
        match kind {
            Some(kind) => self.get_json(&format!("/posts?type={kind}")).await,
            None => self.get_json("/posts").await,
        }
    }

    /// Fetch the current member's own posts.
    pub async fn my_posts(&self) -> ApiResult<Vec<Post>> {
        self.get_json("/posts/my-posts").await
    }

    /// Fetch one post by identifier.
    pub async fn post(&self, id: Uuid) -> ApiResult<Post> {
        self.get_json(&format!("/posts/{id}")).await
    }

    /// Update a post the current member owns.
    pub async fn update_post(&self, id: Uuid, request: &UpdatePostRequest) -> ApiResult<Post> {
        self.put_json(&format!("/posts/{id}"), request).await
    }

    /// Close and remove a post.
    pub async fn delete_post(&self, id: Uuid) -> ApiResult<()> {
        tracing::debug!(%id, "DELETE post");
        self.execute(self.client.delete(self.api_url(&format!("/posts/{id}"))))
            .await?;
        Ok(())
    }

    // --- Messages ---

    /// Fetch the full conversation list for the current member.
    pub async fn conversations(&self) -> ApiResult<Vec<Conversation>> {
        self.get_json("/messages/conversations").await
    }

    /// Open (or return the existing) conversation about a post.
    pub async fn create_conversation(&self, post_id: Uuid) -> ApiResult<Conversation> {
        self.post_json(
            "/messages/conversations",
            &CreateConversationRequest { post_id },
        )
        .await
    }

    /// Fetch all messages in a conversation, in server order.
    pub async fn messages(&self, conversation_id: Uuid) -> ApiResult<Vec<Message>> {
        self.get_json(&format!("/messages/conversations/{conversation_id}/messages"))
            .await
    }

    /// Submit a message; the response carries the canonical server-assigned
    /// id and timestamp.
    pub async fn send_message(&self, conversation_id: Uuid, text: &str) -> ApiResult<Message> {
        self.post_json(
            &format!("/messages/conversations/{conversation_id}/messages"),
            &SendMessageRequest {
                text: text.to_string(),
            },
        )
        .await
    }

    /// Reset the unread state of a conversation for the current member.
    pub async fn mark_read(&self, conversation_id: Uuid) -> ApiResult<()> {
        tracing::debug!(%conversation_id, "POST mark read");
        self.execute(
            self.client
                .post(self.api_url(&format!("/messages/conversations/{conversation_id}/read"))),
        )
        .await?;
        Ok(())
    }

    // --- Activities ---

    /// Fetch the community activity feed, newest first.
    pub async fn recent_activities(&self, limit: Option<usize>) -> ApiResult<Vec<ActivityItem>> {
        match limit {
            Some(limit) => self.get_json(&format!("/activities?limit={limit}")).await,
            None => self.get_json("/activities").await,
        }
    }

    // --- Transactions ---

    /// Open an hour-credit transaction for a completed trade.
    pub async fn create_transaction(
        &self,
        request: &CreateTransactionRequest,
    ) -> ApiResult<Transaction> {
        self.post_json("/transactions", request).await
    }

    /// Fetch the current member's transactions.
    pub async fn transactions(&self) -> ApiResult<Vec<Transaction>> {
        self.get_json("/transactions").await
    }

    /// Fetch one transaction by identifier.
    pub async fn transaction(&self, id: Uuid) -> ApiResult<Transaction> {
        self.get_json(&format!("/transactions/{id}")).await
    }

    /// Confirm the other party's side of a transaction.
    pub async fn confirm_transaction(&self, id: Uuid) -> ApiResult<Transaction> {
        tracing::debug!(%id, "POST confirm transaction");
        let response = self
            .execute(
                self.client
                    .post(self.api_url(&format!("/transactions/{id}/confirm"))),
            )
            .await?;
        Self::decode(response).await
    }
}
