//! Wires one form and one list around a shared cache, the way the page
//! composes them: submitting the form bumps the refresh counter, and picking
//! a record in the list hands it to the form.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::warn;

use crate::api::UserApi;
use crate::cache::UserCache;
use crate::form::{FormError, SubmitOutcome, UserForm};
use crate::list::{DeleteOutcome, ListView, LoadOutcome, UserList};
use crate::sync::{SyncReport, reconcile};

pub struct Directory {
    api: Arc<dyn UserApi>,
    cache: UserCache,
    form: UserForm,
    list: UserList,
    refresh_counter: AtomicU64,
    search: Mutex<String>,
}

impl Directory {
    pub fn new(api: Arc<dyn UserApi>, cache: UserCache) -> Self {
        Self {
            form: UserForm::new(api.clone(), cache.clone()),
            list: UserList::new(api.clone(), cache.clone()),
            api,
            cache,
            refresh_counter: AtomicU64::new(0),
            search: Mutex::new(String::new()),
        }
    }

    pub fn form(&self) -> &UserForm {
        &self.form
    }

    pub fn list(&self) -> &UserList {
        &self.list
    }

    /// Initial load with the current counter.
    pub async fn start(&self) -> LoadOutcome {
        let counter = self.refresh_counter.load(Ordering::SeqCst);
        self.list
            .refresh(counter)
            .await
            .unwrap_or(LoadOutcome::Stale)
    }

    pub async fn refresh(&self) -> LoadOutcome {
        let counter = self.refresh_counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.list
            .refresh(counter)
            .await
            .unwrap_or(LoadOutcome::Stale)
    }

    pub async fn submit(&self) -> Result<SubmitOutcome, FormError> {
        let outcome = self.form.submit().await?;
        self.refresh().await;
        Ok(outcome)
    }

    /// Moves a listed record into the form. Returns false for unknown ids.
    pub fn edit(&self, id: &str) -> bool {
        match self.list.edit(id) {
            Some(user) => {
                self.form.set_editing_target(Some(user));
                true
            }
            None => false,
        }
    }

    pub fn cancel_edit(&self) {
        self.form.set_editing_target(None);
    }

    pub fn set_search(&self, term: impl Into<String>) {
        *self.search.lock().unwrap_or_else(PoisonError::into_inner) = term.into();
    }

    pub fn search_term(&self) -> String {
        self.search
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn delete(&self, id: &str) -> DeleteOutcome {
        self.list.delete(id).await
    }

    pub fn view(&self) -> ListView {
        self.list.view(&self.search_term())
    }

    /// Pushes pending records, then reloads the list.
    pub async fn sync(&self) -> SyncReport {
        let report = match reconcile(self.api.as_ref(), &self.cache).await {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "sync skipped, cache unreadable");
                SyncReport::default()
            }
        };
        self.refresh().await;
        report
    }
}
