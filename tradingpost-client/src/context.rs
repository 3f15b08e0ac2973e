//! The application context: one transport client, one of each store.

use std::sync::Arc;

use shared::config::ClientConfig;

use crate::api::{ApiClient, ApiResult};
use crate::stores::{ActivityStore, MessageStore, PostStore, UserStore};

/// Explicit context object owned by the application root and passed by
/// reference to consumers.
///
/// All stores share a single [`ApiClient`], so signing in through the user
/// store authenticates every subsequent request the other stores make.
#[derive(Debug)]
pub struct AppContext {
    api: Arc<ApiClient>,
    /// Session and profile state.
    pub user: UserStore,
    /// Bulletin-board posts.
    pub posts: PostStore,
    /// Conversations and messages.
    pub messages: MessageStore,
    /// Community activity feed.
    pub activity: ActivityStore,
}

impl AppContext {
    /// Builds a context from the resolved configuration.
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let api = Arc::new(ApiClient::new(config)?);
        Ok(Self {
            user: UserStore::new(api.clone()),
            posts: PostStore::new(api.clone()),
            messages: MessageStore::new(api.clone()),
            activity: ActivityStore::new(api.clone()),
            api,
        })
    }

    /// The shared transport client.
    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    /// Startup sequence: validate any stored token, then warm the caches.
    ///
    /// Every step is fail-soft — a marketplace that cannot reach the
    /// service starts empty instead of crashing, and the per-store
    /// `last_error` slots say why.
    pub async fn initialize(&self) {
        self.user.initialize().await;

        if let Err(err) = self.posts.refresh_posts(None).await {
            tracing::warn!(error = %err, "startup post refresh failed");
        }
        if let Err(err) = self.activity.refresh_activities(None).await {
            tracing::warn!(error = %err, "startup activity refresh failed");
        }
        self.messages.refresh_conversations_best_effort().await;
    }
}
