//! In-process stub of the Trading Post service, bound to an ephemeral port.
//!
//! Tests drive the real transport + stores against this stub and poke its
//! state directly through [`StubState`] to seed data, inject failures, or
//! delay responses.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, TimeZone, Utc};
use client::AppContext;
use shared::config::ClientConfig;
use shared::models::{
    ActivityItem, AuthResponse, Conversation, CreateConversationRequest, CreatePostRequest,
    CreateTransactionRequest, ErrorResponse, Message, Post, SendMessageRequest, SigninRequest,
    SignupRequest, Timestamp, Transaction, UpdatePostRequest, UpdateUserRequest, User,
};
use url::Url;
use uuid::Uuid;

type Failure = (StatusCode, Json<ErrorResponse>);

/// Shared mutable state of the stub service.
#[derive(Default)]
pub struct StubState {
    pub conversations: Mutex<Vec<Conversation>>,
    pub messages: Mutex<Vec<Message>>,
    pub posts: Mutex<Vec<Post>>,
    pub activities: Mutex<Vec<ActivityItem>>,
    pub transactions: Mutex<Vec<Transaction>>,
    pub users: Mutex<Vec<User>>,
    valid_tokens: Mutex<HashSet<String>>,
    fail_once: Mutex<HashSet<&'static str>>,
    list_conversations_delay_ms: AtomicU64,
    clock: AtomicI64,
}

impl StubState {
    /// Strictly increasing timestamps, one second apart.
    pub fn next_timestamp(&self) -> Timestamp {
        let tick = self.clock.fetch_add(1, Ordering::SeqCst);
        let base = Utc.with_ymd_and_hms(2025, 11, 14, 0, 0, 0).unwrap();
        Timestamp(base + Duration::seconds(tick))
    }

    /// Make the next request to `op` answer 500 with an error body.
    pub fn fail_once(&self, op: &'static str) {
        self.fail_once.lock().unwrap().insert(op);
    }

    /// Delay the next conversation-list response by `ms` milliseconds. The
    /// response snapshots state on arrival, before sleeping.
    pub fn delay_next_conversation_list(&self, ms: u64) {
        self.list_conversations_delay_ms.store(ms, Ordering::SeqCst);
    }

    pub fn push_conversation(&self, conversation: Conversation) {
        self.conversations.lock().unwrap().push(conversation);
    }

    pub fn push_message(&self, message: Message) {
        self.messages.lock().unwrap().push(message);
    }

    pub fn push_post(&self, post: Post) {
        self.posts.lock().unwrap().push(post);
    }

    pub fn push_activity(&self, activity: ActivityItem) {
        self.activities.lock().unwrap().push(activity);
    }

    fn take_failure(&self, op: &'static str) -> Option<Failure> {
        if self.fail_once.lock().unwrap().remove(op) {
            Some((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(format!("injected failure in {op}"))),
            ))
        } else {
            None
        }
    }

    fn register_user(&self, name: &str, email: &str) -> AuthResponse {
        let mut users = self.users.lock().unwrap();
        let user = User {
            id: format!("user-{}", users.len() + 1),
            name: name.to_string(),
            email: email.to_string(),
            join_date: self.next_timestamp(),
            time_balance: 0.0,
            skills: vec![],
            bio: None,
            completed_trades: 0,
            rating: 0.0,
        };
        users.push(user.clone());

        let token = format!("tok-{}", user.id);
        self.valid_tokens.lock().unwrap().insert(token.clone());
        AuthResponse { token, user }
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .is_some_and(|token| self.valid_tokens.lock().unwrap().contains(token))
    }
}

fn unauthorized() -> Failure {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new("Unauthorized")),
    )
}

fn not_found(what: &str) -> Failure {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(format!("{what} not found"))),
    )
}

// --- Auth ---

async fn signup(
    State(state): State<Arc<StubState>>,
    Json(request): Json<SignupRequest>,
) -> Json<AuthResponse> {
    Json(state.register_user(&request.name, &request.email))
}

async fn signin(
    State(state): State<Arc<StubState>>,
    Json(request): Json<SigninRequest>,
) -> Result<Json<AuthResponse>, Failure> {
    let user = state
        .users
        .lock()
        .unwrap()
        .iter()
        .find(|u| u.email == request.email)
        .cloned()
        .ok_or_else(unauthorized)?;

    let token = format!("tok-{}", user.id);
    state.valid_tokens.lock().unwrap().insert(token.clone());
    Ok(Json(AuthResponse { token, user }))
}

// --- Users ---

async fn me(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
) -> Result<Json<User>, Failure> {
    if !state.authorized(&headers) {
        return Err(unauthorized());
    }
    let user = state
        .users
        .lock()
        .unwrap()
        .first()
        .cloned()
        .ok_or_else(|| not_found("user"))?;
    Ok(Json(user))
}

async fn update_me(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<User>, Failure> {
    if !state.authorized(&headers) {
        return Err(unauthorized());
    }
    let mut users = state.users.lock().unwrap();
    let user = users.first_mut().ok_or_else(|| not_found("user"))?;
    if let Some(name) = request.name {
        user.name = name;
    }
    if let Some(bio) = request.bio {
        user.bio = Some(bio);
    }
    if let Some(skills) = request.skills {
        user.skills = skills;
    }
    Ok(Json(user.clone()))
}

// --- Posts ---

async fn list_posts(
    State(state): State<Arc<StubState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Post>>, Failure> {
    if let Some(failure) = state.take_failure("list_posts") {
        return Err(failure);
    }
    let posts = state.posts.lock().unwrap();
    let filtered: Vec<Post> = match query.get("type").map(String::as_str) {
        Some(kind) => posts
            .iter()
            .filter(|p| p.kind.to_string() == kind)
            .cloned()
            .collect(),
        None => posts.clone(),
    };
    Ok(Json(filtered))
}

async fn create_post(
    State(state): State<Arc<StubState>>,
    Json(request): Json<CreatePostRequest>,
) -> Json<Post> {
    let post = Post {
        id: Uuid::new_v4(),
        author: "Test Member".to_string(),
        title: request.title,
        description: request.description,
        hours: request.hours,
        kind: request.kind,
        category: request.category,
        date: state.next_timestamp(),
        tags: request.tags,
        active: true,
    };
    state.posts.lock().unwrap().push(post.clone());
    Json(post)
}

async fn my_posts(State(state): State<Arc<StubState>>) -> Json<Vec<Post>> {
    Json(state.posts.lock().unwrap().clone())
}

async fn get_post(
    State(state): State<Arc<StubState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Post>, Failure> {
    state
        .posts
        .lock()
        .unwrap()
        .iter()
        .find(|p| p.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found("post"))
}

async fn update_post(
    State(state): State<Arc<StubState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePostRequest>,
) -> Result<Json<Post>, Failure> {
    let mut posts = state.posts.lock().unwrap();
    let post = posts
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| not_found("post"))?;
    if let Some(title) = request.title {
        post.title = title;
    }
    if let Some(description) = request.description {
        post.description = description;
    }
    if let Some(hours) = request.hours {
        post.hours = hours;
    }
    if let Some(category) = request.category {
        post.category = category;
    }
    if let Some(tags) = request.tags {
        post.tags = tags;
    }
    if let Some(active) = request.active {
        post.active = active;
    }
    Ok(Json(post.clone()))
}

async fn delete_post(State(state): State<Arc<StubState>>, Path(id): Path<Uuid>) -> StatusCode {
    state.posts.lock().unwrap().retain(|p| p.id != id);
    StatusCode::NO_CONTENT
}

// --- Messages ---

async fn list_conversations(
    State(state): State<Arc<StubState>>,
) -> Result<Json<Vec<Conversation>>, Failure> {
    if let Some(failure) = state.take_failure("list_conversations") {
        return Err(failure);
    }
    // Snapshot before any delay so a slow response carries stale data.
    let snapshot = state.conversations.lock().unwrap().clone();
    let delay = state.list_conversations_delay_ms.swap(0, Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
    }
    Ok(Json(snapshot))
}

async fn create_conversation(
    State(state): State<Arc<StubState>>,
    Json(request): Json<CreateConversationRequest>,
) -> Json<Conversation> {
    {
        let conversations = state.conversations.lock().unwrap();
        if let Some(existing) = conversations.iter().find(|c| c.post_id == request.post_id) {
            return Json(existing.clone());
        }
    }

    let (post_title, post_author) = state
        .posts
        .lock()
        .unwrap()
        .iter()
        .find(|p| p.id == request.post_id)
        .map(|p| (p.title.clone(), p.author.clone()))
        .unwrap_or_else(|| ("Untitled post".to_string(), "Unknown".to_string()));

    let conversation = Conversation {
        id: Uuid::new_v4(),
        post_id: request.post_id,
        post_title,
        post_author: post_author.clone(),
        participants: vec!["user-1".to_string(), post_author],
        last_message: String::new(),
        last_message_time: state.next_timestamp(),
        unread_count: 0,
    };
    state
        .conversations
        .lock()
        .unwrap()
        .push(conversation.clone());
    Json(conversation)
}

async fn list_messages(
    State(state): State<Arc<StubState>>,
    Path(id): Path<Uuid>,
) -> Json<Vec<Message>> {
    let messages: Vec<Message> = state
        .messages
        .lock()
        .unwrap()
        .iter()
        .filter(|m| m.conversation_id == id)
        .cloned()
        .collect();
    Json(messages)
}

async fn send_message(
    State(state): State<Arc<StubState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<Message>, Failure> {
    if let Some(failure) = state.take_failure("send_message") {
        return Err(failure);
    }
    if !state.conversations.lock().unwrap().iter().any(|c| c.id == id) {
        return Err(not_found("conversation"));
    }

    let message = Message {
        id: Uuid::new_v4(),
        conversation_id: id,
        sender_id: "user-1".to_string(),
        sender_name: "Test Member".to_string(),
        text: request.text,
        timestamp: state.next_timestamp(),
        read: false,
    };
    state.messages.lock().unwrap().push(message.clone());

    let mut conversations = state.conversations.lock().unwrap();
    if let Some(conversation) = conversations.iter_mut().find(|c| c.id == id) {
        conversation.last_message = Conversation::preview_for(&message.text);
        conversation.last_message_time = message.timestamp;
    }
    Ok(Json(message))
}

async fn mark_read(
    State(state): State<Arc<StubState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, Failure> {
    if let Some(failure) = state.take_failure("mark_read") {
        return Err(failure);
    }
    if let Some(conversation) = state
        .conversations
        .lock()
        .unwrap()
        .iter_mut()
        .find(|c| c.id == id)
    {
        conversation.unread_count = 0;
    }
    for message in state
        .messages
        .lock()
        .unwrap()
        .iter_mut()
        .filter(|m| m.conversation_id == id)
    {
        message.read = true;
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}

// --- Activities ---

async fn list_activities(
    State(state): State<Arc<StubState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Vec<ActivityItem>> {
    let mut activities = state.activities.lock().unwrap().clone();
    if let Some(limit) = query.get("limit").and_then(|v| v.parse::<usize>().ok()) {
        activities.truncate(limit);
    }
    Json(activities)
}

// --- Transactions ---

async fn create_transaction(
    State(state): State<Arc<StubState>>,
    Json(request): Json<CreateTransactionRequest>,
) -> Json<Transaction> {
    let transaction = Transaction {
        id: Uuid::new_v4(),
        post_id: request.post_id,
        provider_id: request.provider_id,
        receiver_id: request.receiver_id,
        hours: request.hours,
        confirmed: false,
        created_at: state.next_timestamp(),
    };
    state
        .transactions
        .lock()
        .unwrap()
        .push(transaction.clone());
    Json(transaction)
}

async fn list_transactions(State(state): State<Arc<StubState>>) -> Json<Vec<Transaction>> {
    Json(state.transactions.lock().unwrap().clone())
}

async fn get_transaction(
    State(state): State<Arc<StubState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Transaction>, Failure> {
    state
        .transactions
        .lock()
        .unwrap()
        .iter()
        .find(|t| t.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found("transaction"))
}

async fn confirm_transaction(
    State(state): State<Arc<StubState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Transaction>, Failure> {
    let mut transactions = state.transactions.lock().unwrap();
    let transaction = transactions
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| not_found("transaction"))?;
    transaction.confirmed = true;
    Ok(Json(transaction.clone()))
}

fn router(state: Arc<StubState>) -> Router {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/signin", post(signin))
        .route("/users/me", get(me).put(update_me))
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/my-posts", get(my_posts))
        .route(
            "/posts/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route(
            "/messages/conversations",
            get(list_conversations).post(create_conversation),
        )
        .route(
            "/messages/conversations/{id}/messages",
            get(list_messages).post(send_message),
        )
        .route("/messages/conversations/{id}/read", post(mark_read))
        .route("/activities", get(list_activities))
        .route("/transactions", get(list_transactions).post(create_transaction))
        .route("/transactions/{id}", get(get_transaction))
        .route("/transactions/{id}/confirm", post(confirm_transaction))
        .with_state(state)
}

/// A running stub service plus a handle to its state.
pub struct StubService {
    pub state: Arc<StubState>,
    pub base_url: Url,
}

/// Binds the stub to an ephemeral local port and serves it in the
/// background for the rest of the test.
pub async fn spawn_stub() -> StubService {
    let state = Arc::new(StubState::default());
    let app = router(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    StubService {
        state,
        base_url: Url::parse(&format!("http://{addr}")).unwrap(),
    }
}

/// An [`AppContext`] wired to the stub.
pub fn context_for(stub: &StubService) -> AppContext {
    let config = ClientConfig {
        api_base_url: stub.base_url.clone(),
        ..ClientConfig::with_defaults()
    };
    AppContext::new(&config).unwrap()
}
