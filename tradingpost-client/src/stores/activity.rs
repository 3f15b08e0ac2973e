//! Community activity feed store. Read-only from the client's point of
//! view: the service appends entries as members post and connect.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use shared::models::ActivityItem;

use crate::api::{ApiClient, ApiError, ApiResult};

/// Number of entries the recent-activities view returns.
const RECENT_ACTIVITIES: usize = 10;

#[derive(Debug, Default)]
struct ActivityState {
    activities: Vec<ActivityItem>,
    in_flight: u32,
    last_error: Option<ApiError>,
}

/// In-memory cache of the community activity feed.
#[derive(Debug)]
pub struct ActivityStore {
    api: Arc<ApiClient>,
    state: RwLock<ActivityState>,
}

impl ActivityStore {
    /// Creates an empty store backed by the given transport client.
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            state: RwLock::new(ActivityState::default()),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, ActivityState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, ActivityState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Full resync of the feed. On failure the cached feed is cleared
    /// (fail-safe to empty), the error is recorded, and the error
    /// propagates.
    pub async fn refresh_activities(&self, limit: Option<usize>) -> ApiResult<()> {
        self.write_state().in_flight += 1;
        let result = self.api.recent_activities(limit).await;

        let mut state = self.write_state();
        state.in_flight -= 1;
        match result {
            Ok(activities) => {
                state.activities = activities;
                state.last_error = None;
                Ok(())
            }
            Err(err) => {
                state.activities.clear();
                state.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// All cached feed entries, in cache order.
    pub fn activities(&self) -> Vec<ActivityItem> {
        self.read_state().activities.clone()
    }

    /// The ten newest cached entries by timestamp.
    pub fn recent_activities(&self) -> Vec<ActivityItem> {
        let mut activities = self.read_state().activities.clone();
        activities.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        activities.truncate(RECENT_ACTIVITIES);
        activities
    }

    /// Whether a refresh is currently awaiting the service.
    pub fn is_loading(&self) -> bool {
        self.read_state().in_flight > 0
    }

    /// The error recorded by the most recent failed refresh.
    pub fn last_error(&self) -> Option<ApiError> {
        self.read_state().last_error.clone()
    }

    #[cfg(test)]
    fn seed(&self, activities: Vec<ActivityItem>) {
        self.write_state().activities = activities;
    }
}
