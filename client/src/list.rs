//! The searchable user list.
//!
//! Loading shows whatever the cache holds straight away, then replaces it
//! with the API's list once that arrives. Each load takes a generation
//! number; a response that arrives after a newer load started is dropped.

use directory_model::{User, filter_users};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use crate::api::{ApiError, UserApi};
use crate::cache::{CachedUser, SyncState, UserCache, is_temporary_id};

pub const FETCH_FAILED: &str = "Failed to fetch users from API. Using local data if available.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListView {
    Loading,
    Error(String),
    Empty,
    NoMatches,
    Users(Vec<CachedUser>),
}

/// Where the displayed list came from after a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Network,
    /// API failed; cached data stays on screen.
    Cache,
    /// API failed and nothing was cached.
    Unavailable,
    /// A newer load started before this one finished.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub removed: bool,
    pub deleted_remotely: bool,
}

#[derive(Default)]
struct ListState {
    users: Vec<CachedUser>,
    error: Option<String>,
    loading: bool,
    last_refresh: Option<u64>,
}

pub struct UserList {
    api: Arc<dyn UserApi>,
    cache: UserCache,
    state: Mutex<ListState>,
    generation: AtomicU64,
}

impl UserList {
    pub fn new(api: Arc<dyn UserApi>, cache: UserCache) -> Self {
        Self {
            api,
            cache,
            state: Mutex::new(ListState {
                loading: true,
                ..ListState::default()
            }),
            generation: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ListState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn users(&self) -> Vec<CachedUser> {
        self.lock().users.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    /// Loads when `counter` differs from the last one seen.
    pub async fn refresh(&self, counter: u64) -> Option<LoadOutcome> {
        {
            let mut state = self.lock();
            if state.last_refresh == Some(counter) {
                return None;
            }
            state.last_refresh = Some(counter);
        }
        Some(self.load().await)
    }

    pub async fn load(&self) -> LoadOutcome {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let cached = match self.cache.load() {
            Ok(users) => users,
            Err(e) => {
                warn!(error = %e, "ignoring unreadable cache");
                None
            }
        };

        {
            let mut state = self.lock();
            state.loading = true;
            if let Some(users) = &cached {
                state.users = users.clone();
                state.loading = false;
            }
        }

        let fetched = self.api.list().await;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "discarding stale list response");
            return LoadOutcome::Stale;
        }

        match fetched {
            Ok(users) => {
                // Form writes may have landed while the request was in flight.
                let current = match self.cache.load() {
                    Ok(local) => local.unwrap_or_default(),
                    Err(e) => {
                        warn!(error = %e, "ignoring unreadable cache");
                        cached.unwrap_or_default()
                    }
                };
                let merged = merge_unsynced(users, &current);
                if let Err(e) = self.cache.replace(&merged) {
                    warn!(error = %e, "failed to cache fetched users");
                }

                info!(count = merged.len(), "user list loaded");
                let mut state = self.lock();
                state.users = merged;
                state.error = None;
                state.loading = false;
                LoadOutcome::Network
            }
            Err(e) => {
                warn!(error = %e, "API list failed");
                let mut state = self.lock();
                state.loading = false;
                if cached.is_some() {
                    LoadOutcome::Cache
                } else {
                    state.error = Some(FETCH_FAILED.to_string());
                    LoadOutcome::Unavailable
                }
            }
        }
    }

    pub fn view(&self, term: &str) -> ListView {
        let state = self.lock();
        if state.loading {
            return ListView::Loading;
        }
        if state.users.is_empty() {
            return match &state.error {
                Some(error) => ListView::Error(error.clone()),
                None => ListView::Empty,
            };
        }

        let filtered = filter_users(&state.users, term);
        if filtered.is_empty() {
            ListView::NoMatches
        } else {
            ListView::Users(filtered)
        }
    }

    /// The record to hand to the form for editing.
    pub fn edit(&self, id: &str) -> Option<CachedUser> {
        self.lock().users.iter().find(|user| user.id == id).cloned()
    }

    /// Removes the record locally whatever the API says. Temporary ids were
    /// never stored remotely, so the API is not contacted for them.
    pub async fn delete(&self, id: &str) -> DeleteOutcome {
        let deleted_remotely = if is_temporary_id(id) {
            debug!(%id, "temporary id, skipping API delete");
            false
        } else {
            match self.api.delete(id).await {
                Ok(()) => true,
                Err(ApiError::NotFound(_)) => {
                    debug!(%id, "already gone from API");
                    false
                }
                Err(e) => {
                    warn!(error = %e, %id, "API delete failed, removing locally only");
                    false
                }
            }
        };

        let removed = {
            let mut state = self.lock();
            let before = state.users.len();
            state.users.retain(|user| user.id != id);
            state.users.len() != before
        };

        let uncached = match self.cache.remove(id) {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, %id, "failed to remove user from cache");
                false
            }
        };

        info!(%id, deleted_remotely, "user deleted");
        DeleteOutcome {
            removed: removed || uncached,
            deleted_remotely,
        }
    }
}

/// The fetched list, except that records still carrying local changes keep
/// their cached copy, and local-only records are appended after it.
fn merge_unsynced(fetched: Vec<User>, cached: &[CachedUser]) -> Vec<CachedUser> {
    let unsynced: Vec<&CachedUser> = cached
        .iter()
        .filter(|user| user.sync != SyncState::Synced)
        .collect();

    let mut merged: Vec<CachedUser> = fetched
        .into_iter()
        .map(|user| match unsynced.iter().find(|local| local.id == user.id) {
            Some(local) => (*local).clone(),
            None => CachedUser::synced(user),
        })
        .collect();

    for local in unsynced {
        if !merged.iter().any(|user| user.id == local.id) {
            merged.push(local.clone());
        }
    }
    merged
}
