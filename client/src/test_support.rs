//! In-process stand-in for the users API.

use async_trait::async_trait;
use chrono::Utc;
use directory_model::{Gender, User, UserDraft, UserFields};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::api::{ApiError, UserApi};

pub fn fields(name: &str) -> UserFields {
    UserFields {
        name: name.to_string(),
        gender: Gender::Female,
        designation: "Developer".to_string(),
        favorites: vec!["Music".to_string()],
    }
}

pub struct FakeApi {
    users: Mutex<Vec<User>>,
    online: AtomicBool,
    calls: AtomicUsize,
    next_id: AtomicUsize,
    delay: Option<Duration>,
}

impl FakeApi {
    pub fn online() -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            online: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
            next_id: AtomicUsize::new(1),
            delay: None,
        }
    }

    pub fn offline() -> Self {
        let api = Self::online();
        api.set_online(false);
        api
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Number of requests attempted, reachable or not.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> Vec<User> {
        self.users.lock().unwrap().clone()
    }

    pub fn seed(&self, fields: UserFields) -> User {
        let user = self.build(fields);
        self.users.lock().unwrap().push(user.clone());
        user
    }

    pub fn remove_directly(&self, id: &str) {
        self.users.lock().unwrap().retain(|u| u.id != id);
    }

    fn build(&self, fields: UserFields) -> User {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        User {
            id: format!("srv{n}"),
            fields,
            created_at: now,
            updated_at: now,
        }
    }

    async fn enter(&self) -> Result<(), ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ApiError::Connectivity("connection refused".to_string()))
        }
    }
}

#[async_trait]
impl UserApi for FakeApi {
    async fn list(&self) -> Result<Vec<User>, ApiError> {
        self.enter().await?;
        Ok(self.stored())
    }

    async fn create(&self, fields: &UserFields) -> Result<User, ApiError> {
        self.enter().await?;
        let fields = UserDraft::from(fields.clone())
            .validate()
            .map_err(|e| ApiError::Validation(e.to_string()))?;
        Ok(self.seed(fields))
    }

    async fn update(&self, id: &str, fields: &UserFields) -> Result<User, ApiError> {
        self.enter().await?;
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| ApiError::NotFound(id.to_string()))?;
        user.fields = fields.clone();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.enter().await?;
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            return Err(ApiError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
