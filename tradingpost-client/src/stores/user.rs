//! Session/profile store. Owns the authenticated user and drives the
//! transport client's bearer token — the auth seam the other stores rely on.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use shared::models::{AuthResponse, SigninRequest, SignupRequest, UpdateUserRequest, User};

use crate::api::{ApiClient, ApiError, ApiResult};

#[derive(Debug, Default)]
struct UserState {
    current_user: Option<User>,
    is_authenticated: bool,
    in_flight: u32,
    last_error: Option<ApiError>,
}

/// The current member's session and profile.
#[derive(Debug)]
pub struct UserStore {
    api: Arc<ApiClient>,
    state: RwLock<UserState>,
}

impl UserStore {
    /// Creates a signed-out store backed by the given transport client.
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            state: RwLock::new(UserState::default()),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, UserState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, UserState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply_auth_response(&self, response: &AuthResponse) {
        self.api.set_token(Some(response.token.clone()));
        let mut state = self.write_state();
        state.current_user = Some(response.user.clone());
        state.is_authenticated = true;
        state.last_error = None;
    }

    // --- Operations ---

    /// Validates a previously configured token by fetching the profile
    /// behind it. Fail-soft: an invalid or expired token is dropped and the
    /// store stays signed out rather than surfacing an error at startup.
    pub async fn initialize(&self) {
        if self.api.current_token().is_none() {
            return;
        }

        self.write_state().in_flight += 1;
        let result = self.api.me().await;
        self.write_state().in_flight -= 1;

        match result {
            Ok(user) => {
                let mut state = self.write_state();
                state.current_user = Some(user);
                state.is_authenticated = true;
            }
            Err(err) => {
                tracing::warn!(error = %err, "stored token rejected; signing out");
                self.api.set_token(None);
                let mut state = self.write_state();
                state.current_user = None;
                state.is_authenticated = false;
            }
        }
    }

    /// Registers a new member and signs them in.
    pub async fn signup(&self, email: &str, password: &str, name: &str) -> ApiResult<AuthResponse> {
        let request = SignupRequest {
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
        };
        match self.api.signup(&request).await {
            Ok(response) => {
                self.apply_auth_response(&response);
                Ok(response)
            }
            Err(err) => {
                self.write_state().last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Signs an existing member in, storing the bearer token on success.
    pub async fn signin(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        let request = SigninRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        match self.api.signin(&request).await {
            Ok(response) => {
                self.apply_auth_response(&response);
                Ok(response)
            }
            Err(err) => {
                self.write_state().last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Clears the token and all session state. Purely local.
    pub fn signout(&self) {
        self.api.set_token(None);
        let mut state = self.write_state();
        state.current_user = None;
        state.is_authenticated = false;
        state.last_error = None;
    }

    /// Updates the profile remote-first and caches the server's version of
    /// record.
    pub async fn update_profile(&self, request: &UpdateUserRequest) -> ApiResult<User> {
        match self.api.update_me(request).await {
            Ok(user) => {
                let mut state = self.write_state();
                state.current_user = Some(user.clone());
                state.last_error = None;
                Ok(user)
            }
            Err(err) => {
                self.write_state().last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Re-fetches the profile (e.g. after a trade changes the balance).
    /// Fail-soft: logs and keeps the cached profile on failure.
    pub async fn refresh_user(&self) {
        match self.api.me().await {
            Ok(user) => {
                self.write_state().current_user = Some(user);
            }
            Err(err) => {
                tracing::warn!(error = %err, "profile refresh failed");
            }
        }
    }

    // --- Derived views ---

    /// The signed-in member, if any.
    pub fn current_user(&self) -> Option<User> {
        self.read_state().current_user.clone()
    }

    /// Whether a member is signed in.
    pub fn is_authenticated(&self) -> bool {
        self.read_state().is_authenticated
    }

    /// Whether any store operation is currently awaiting the service.
    pub fn is_loading(&self) -> bool {
        self.read_state().in_flight > 0
    }

    /// The error recorded by the most recent failed operation.
    pub fn last_error(&self) -> Option<ApiError> {
        self.read_state().last_error.clone()
    }
}
