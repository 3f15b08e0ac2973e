//! Bulletin-board post store. Same contract as the message store, simpler
//! invariants: one collection, no denormalized counters.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use shared::models::{CreatePostRequest, Post, PostKind, UpdatePostRequest};
use uuid::Uuid;

use crate::api::{ApiClient, ApiError, ApiResult};

/// Number of posts the recent-posts view returns.
const RECENT_POSTS: usize = 5;

#[derive(Debug, Default)]
struct PostState {
    posts: Vec<Post>,
    in_flight: u32,
    last_error: Option<ApiError>,
}

/// In-memory cache of marketplace posts, synchronized from the Trading Post
/// service.
#[derive(Debug)]
pub struct PostStore {
    api: Arc<ApiClient>,
    state: RwLock<PostState>,
}

impl PostStore {
    /// Creates an empty store backed by the given transport client.
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            state: RwLock::new(PostState::default()),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, PostState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, PostState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_failure(&self, err: &ApiError) {
        self.write_state().last_error = Some(err.clone());
    }

    // --- Operations ---

    /// Full resync of the post list, optionally restricted to offers or
    /// requests. On failure the list is cleared (fail-safe to empty), the
    /// error is recorded, and the error propagates.
    pub async fn refresh_posts(&self, kind: Option<PostKind>) -> ApiResult<()> {
        self.write_state().in_flight += 1;
        let result = self.api.posts(kind).await;

        let mut state = self.write_state();
        state.in_flight -= 1;
        match result {
            Ok(posts) => {
                state.posts = posts;
                state.last_error = None;
                Ok(())
            }
            Err(err) => {
                state.posts.clear();
                state.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Publishes a post and prepends the server-confirmed copy to the cache.
    pub async fn create_post(&self, request: &CreatePostRequest) -> ApiResult<Post> {
        match self.api.create_post(request).await {
            Ok(post) => {
                let mut state = self.write_state();
                state.posts.insert(0, post.clone());
                state.last_error = None;
                Ok(post)
            }
            Err(err) => {
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    /// Updates a post remote-first and replaces the cached copy with the
    /// server's version of record.
    pub async fn update_post(&self, id: Uuid, request: &UpdatePostRequest) -> ApiResult<Post> {
        match self.api.update_post(id, request).await {
            Ok(post) => {
                let mut state = self.write_state();
                if let Some(cached) = state.posts.iter_mut().find(|p| p.id == id) {
                    *cached = post.clone();
                }
                state.last_error = None;
                Ok(post)
            }
            Err(err) => {
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    /// Deletes a post remote-first; the cached copy goes away only once the
    /// service has confirmed.
    pub async fn delete_post(&self, id: Uuid) -> ApiResult<()> {
        match self.api.delete_post(id).await {
            Ok(()) => {
                let mut state = self.write_state();
                state.posts.retain(|p| p.id != id);
                state.last_error = None;
                Ok(())
            }
            Err(err) => {
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    // --- Derived views ---

    /// All cached posts, in cache order.
    pub fn all_posts(&self) -> Vec<Post> {
        self.read_state().posts.clone()
    }

    /// Cached posts offering a service.
    pub fn offer_posts(&self) -> Vec<Post> {
        self.posts_of_kind(PostKind::Offer)
    }

    /// Cached posts requesting a service.
    pub fn request_posts(&self) -> Vec<Post> {
        self.posts_of_kind(PostKind::Request)
    }

    fn posts_of_kind(&self, kind: PostKind) -> Vec<Post> {
        self.read_state()
            .posts
            .iter()
            .filter(|p| p.kind == kind)
            .cloned()
            .collect()
    }

    /// Looks a post up by id.
    pub fn post_by_id(&self, id: Uuid) -> Option<Post> {
        self.read_state().posts.iter().find(|p| p.id == id).cloned()
    }

    /// The five newest cached posts by creation date.
    pub fn recent_posts(&self) -> Vec<Post> {
        let mut posts = self.read_state().posts.clone();
        posts.sort_by(|a, b| b.date.cmp(&a.date));
        posts.truncate(RECENT_POSTS);
        posts
    }

    /// Whether any store operation is currently awaiting the service.
    pub fn is_loading(&self) -> bool {
        self.read_state().in_flight > 0
    }

    /// The error recorded by the most recent failed operation.
    pub fn last_error(&self) -> Option<ApiError> {
        self.read_state().last_error.clone()
    }

    #[cfg(test)]
    fn seed(&self, posts: Vec<Post>) {
        self.write_state().posts = posts;
    }
}
