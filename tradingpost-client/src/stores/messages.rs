//! The conversation/message store — the stateful heart of the client.
//!
//! Two denormalized collections are kept consistent with the service:
//! conversations (with their unread counters and last-message previews) and
//! messages. The service owns id assignment, ordering, and unread
//! accounting; this store is a read-through, write-through cache that
//! re-derives anything it cannot compute safely on its own.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use shared::models::{Conversation, Message};
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::api::{ApiClient, ApiError, ApiResult};

#[derive(Default)]
struct MessageState {
    /// Conversations in server order, keyed by id.
    conversations: Vec<Conversation>,
    /// Cached messages across all conversations, in load/append order.
    messages: Vec<Message>,
    /// Number of store operations currently awaiting the service.
    in_flight: u32,
    /// Error recorded by the most recent operation, if it failed.
    last_error: Option<ApiError>,
}

/// In-memory cache of conversations and messages, synchronized from the
/// Trading Post service.
///
/// Mutations happen only through the async operations; the derived views
/// are synchronous pure reads, so UI consumers can query freely while an
/// operation is in flight. Write operations on the *same* conversation are
/// serialized through a per-conversation queue: an interleaved
/// [`send_message`](Self::send_message) and
/// [`mark_conversation_as_read`](Self::mark_conversation_as_read) would
/// otherwise race on the unread counter.
#[derive(Debug)]
pub struct MessageStore {
    api: Arc<ApiClient>,
    state: RwLock<MessageState>,
    /// Generation counter fencing overlapping full resyncs: a response that
    /// lost the race against a newer refresh is discarded, not applied.
    refresh_epoch: AtomicU64,
    conversation_locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl std::fmt::Debug for MessageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageState")
            .field("conversations", &self.conversations.len())
            .field("messages", &self.messages.len())
            .field("in_flight", &self.in_flight)
            .field("last_error", &self.last_error)
            .finish()
    }
}

impl MessageStore {
    /// Creates an empty store backed by the given transport client.
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            state: RwLock::new(MessageState::default()),
            refresh_epoch: AtomicU64::new(0),
            conversation_locks: Mutex::new(HashMap::new()),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, MessageState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, MessageState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn conversation_lock(&self, conversation_id: Uuid) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .conversation_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks.entry(conversation_id).or_default().clone()
    }

    fn track_in_flight(&self) -> InFlightGuard<'_> {
        self.write_state().in_flight += 1;
        InFlightGuard { store: self }
    }

    fn record_failure(&self, err: &ApiError) {
        self.write_state().last_error = Some(err.clone());
    }

    // --- Operations ---

    /// Full resync: fetches the conversation list and replaces local state
    /// wholesale.
    ///
    /// On success the cache exactly mirrors server state at the moment of
    /// the call. On failure the conversation list is **cleared** rather than
    /// left stale (fail-safe to empty), the error is recorded, and the error
    /// propagates. A response that was overtaken by a newer refresh is
    /// discarded without touching state.
    pub async fn refresh_conversations(&self) -> ApiResult<()> {
        let epoch = self.refresh_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = self.track_in_flight();

        let result = self.api.conversations().await;
        if self.refresh_epoch.load(Ordering::SeqCst) != epoch {
            // A newer refresh owns the cache now; drop this response.
            return result.map(|_| ());
        }

        let mut state = self.write_state();
        match result {
            Ok(conversations) => {
                state.conversations = conversations;
                state.last_error = None;
                Ok(())
            }
            Err(err) => {
                state.conversations.clear();
                state.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Best-effort variant of [`refresh_conversations`](Self::refresh_conversations):
    /// logs and continues instead of propagating.
    pub async fn refresh_conversations_best_effort(&self) {
        if let Err(err) = self.refresh_conversations().await {
            tracing::warn!(error = %err, "background conversation refresh failed");
        }
    }

    /// Opens a conversation about a post, or returns the existing one.
    ///
    /// Idempotent from the caller's perspective: the local cache is checked
    /// by `post_id` before the service is called, and the service itself
    /// returns the existing conversation for a repeated pair, so no
    /// duplicate entries can accumulate.
    pub async fn create_conversation(&self, post_id: Uuid) -> ApiResult<Conversation> {
        if let Some(existing) = self.conversation_by_post_id(post_id) {
            return Ok(existing);
        }

        let _guard = self.track_in_flight();
        match self.api.create_conversation(post_id).await {
            Ok(conversation) => {
                let mut state = self.write_state();
                // A concurrent call may have inserted it while we awaited.
                if !state.conversations.iter().any(|c| c.id == conversation.id) {
                    state.conversations.push(conversation.clone());
                }
                state.last_error = None;
                Ok(conversation)
            }
            Err(err) => {
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    /// Fetches all messages of a conversation and replaces that
    /// conversation's cached slice with the fresh, server-ordered set.
    ///
    /// Replacement (not merge) guards against duplicate accumulation from
    /// repeated calls; messages of other conversations are untouched.
    pub async fn load_messages(&self, conversation_id: Uuid) -> ApiResult<Vec<Message>> {
        let _guard = self.track_in_flight();
        match self.api.messages(conversation_id).await {
            Ok(fresh) => {
                let mut state = self.write_state();
                state
                    .messages
                    .retain(|m| m.conversation_id != conversation_id);
                state.messages.extend(fresh.iter().cloned());
                state.last_error = None;
                Ok(fresh)
            }
            Err(err) => {
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    /// Sends a message in three phases:
    ///
    /// 1. submit to the service, obtaining the canonical message with its
    ///    server-assigned id and timestamp — a failure here aborts with no
    ///    local change;
    /// 2. append the confirmed message to the cache;
    /// 3. update the conversation's preview fields, then run a full
    ///    [`refresh_conversations`](Self::refresh_conversations) to
    ///    re-derive authoritative unread counts — the recipient's counters
    ///    depend on state only the service can assert.
    ///
    /// A phase-3 failure is recorded and re-raised, but the delivered
    /// message from phases 1–2 stays cached.
    pub async fn send_message(&self, conversation_id: Uuid, text: &str) -> ApiResult<Message> {
        let lock = self.conversation_lock(conversation_id);
        let _serialized = lock.lock().await;
        let _guard = self.track_in_flight();

        let message = match self.api.send_message(conversation_id, text).await {
            Ok(message) => message,
            Err(err) => {
                self.record_failure(&err);
                return Err(err);
            }
        };

        {
            let mut state = self.write_state();
            state.messages.push(message.clone());
            if let Some(conversation) = state
                .conversations
                .iter_mut()
                .find(|c| c.id == conversation_id)
            {
                conversation.last_message = Conversation::preview_for(&message.text);
                conversation.last_message_time = message.timestamp;
            }
            state.last_error = None;
        }

        self.refresh_conversations().await?;
        Ok(message)
    }

    /// Resets the unread state of a conversation, remote first.
    ///
    /// Only after the service acknowledges does the store zero the local
    /// `unread_count` and flip `read` on the cached messages — all or
    /// nothing, so local and remote views cannot diverge.
    pub async fn mark_conversation_as_read(&self, conversation_id: Uuid) -> ApiResult<()> {
        let lock = self.conversation_lock(conversation_id);
        let _serialized = lock.lock().await;
        let _guard = self.track_in_flight();

        match self.api.mark_read(conversation_id).await {
            Ok(()) => {
                let mut state = self.write_state();
                if let Some(conversation) = state
                    .conversations
                    .iter_mut()
                    .find(|c| c.id == conversation_id)
                {
                    conversation.unread_count = 0;
                }
                for message in state
                    .messages
                    .iter_mut()
                    .filter(|m| m.conversation_id == conversation_id)
                {
                    message.read = true;
                }
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

    /// All cached conversations, ordered by `last_message_time` descending.
    pub fn all_conversations(&self) -> Vec<Conversation> {
        let mut conversations = self.read_state().conversations.clone();
        conversations.sort_by(|a, b| b.last_message_time.cmp(&a.last_message_time));
        conversations
    }

    /// Sum of unread counters across all cached conversations.
    pub fn unread_total(&self) -> u32 {
        self.read_state()
            .conversations
            .iter()
            .map(|c| c.unread_count)
            .sum()
    }

    /// All cached messages of one conversation, in cache order.
    pub fn messages_for(&self, conversation_id: Uuid) -> Vec<Message> {
        self.read_state()
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect()
    }

    /// Looks a conversation up by id.
    pub fn conversation_by_id(&self, id: Uuid) -> Option<Conversation> {
        self.read_state()
            .conversations
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    /// Looks a conversation up by the post it is about.
    pub fn conversation_by_post_id(&self, post_id: Uuid) -> Option<Conversation> {
        self.read_state()
            .conversations
            .iter()
            .find(|c| c.post_id == post_id)
            .cloned()
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
    fn seed(&self, conversations: Vec<Conversation>, messages: Vec<Message>) {
        let mut state = self.write_state();
        state.conversations = conversations;
        state.messages = messages;
    }
}

struct InFlightGuard<'a> {
    store: &'a MessageStore,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.store.write_state().in_flight -= 1;
    }
}
