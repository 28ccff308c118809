//! # Local cache
//!
//! A key/value store holding the last known user list under the fixed key
//! [`USERS_KEY`]. The list is overwritten after every successful fetch and
//! patched one record at a time after every create, update or delete,
//! whether or not the API accepted the change.
//!
//! There is no TTL, size bound or schema version. Concurrent writers are not
//! coordinated: the last write wins.
//!
//! ## Storage backends
//!
//! - [`FileStorage`]: one `<key>.json` file per key inside a directory
//! - [`MemoryStorage`]: process-local map, used by tests

use chrono::{DateTime, Utc};
use directory_model::{Searchable, User, UserFields};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

pub const USERS_KEY: &str = "users";
pub const TEMP_ID_PREFIX: &str = "temp_";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache content unreadable: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub trait CacheStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;

    fn remove(&self, key: &str) -> Result<(), CacheError>;
}

pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl CacheStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root)?;
        }
        fs::write(self.entry_path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        let path = self.entry_path(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// Whether a cached record is known to match the API copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    #[default]
    Synced,
    /// Written locally while the API was unreachable.
    Pending,
    /// The API no longer accepts the local copy (missing or rejected).
    Conflict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedUser {
    pub id: String,
    #[serde(flatten)]
    pub fields: UserFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sync: SyncState,
}

impl CachedUser {
    pub fn synced(user: User) -> Self {
        Self {
            id: user.id,
            fields: user.fields,
            created_at: Some(user.created_at),
            updated_at: Some(user.updated_at),
            sync: SyncState::Synced,
        }
    }

    pub fn pending(id: String, fields: UserFields) -> Self {
        Self {
            id,
            fields,
            created_at: None,
            updated_at: None,
            sync: SyncState::Pending,
        }
    }

    pub fn is_temporary(&self) -> bool {
        is_temporary_id(&self.id)
    }
}

impl Searchable for CachedUser {
    fn fields(&self) -> &UserFields {
        &self.fields
    }
}

pub fn is_temporary_id(id: &str) -> bool {
    id.starts_with(TEMP_ID_PREFIX)
}

/// `temp_<unix millis>`, bumped past any id already present in `existing`.
pub fn temporary_id(existing: &[CachedUser]) -> String {
    let mut millis = Utc::now().timestamp_millis();
    loop {
        let id = format!("{TEMP_ID_PREFIX}{millis}");
        if !existing.iter().any(|user| user.id == id) {
            return id;
        }
        millis += 1;
    }
}

/// The user list as stored under [`USERS_KEY`].
#[derive(Clone)]
pub struct UserCache {
    storage: Arc<dyn CacheStorage>,
}

impl UserCache {
    pub fn new(storage: Arc<dyn CacheStorage>) -> Self {
        Self { storage }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// `None` when nothing has been cached yet.
    pub fn load(&self) -> Result<Option<Vec<CachedUser>>, CacheError> {
        match self.storage.get(USERS_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn replace(&self, users: &[CachedUser]) -> Result<(), CacheError> {
        let raw = serde_json::to_string(users)?;
        self.storage.set(USERS_KEY, &raw)
    }

    /// Replaces the record with the same id in place, or appends it.
    pub fn upsert(&self, user: CachedUser) -> Result<(), CacheError> {
        let mut users = self.load()?.unwrap_or_default();
        match users.iter_mut().find(|existing| existing.id == user.id) {
            Some(existing) => *existing = user,
            None => users.push(user),
        }
        self.replace(&users)
    }

    /// Returns whether a record was removed.
    pub fn remove(&self, id: &str) -> Result<bool, CacheError> {
        let mut users = self.load()?.unwrap_or_default();
        let before = users.len();
        users.retain(|user| user.id != id);
        self.replace(&users)?;
        Ok(users.len() != before)
    }

    pub fn clear(&self) -> Result<(), CacheError> {
        self.storage.remove(USERS_KEY)
    }
}
