//! Create/edit form for a single user.
//!
//! The form is in `Create` mode until an editing target is supplied; every
//! target change resets the fields and clears errors. Validation runs only on
//! submit. A submit that reaches the API stores the server copy in the cache;
//! one that does not is cached as `pending` under its existing id or a new
//! temporary one.

use directory_model::validation::{
    DESIGNATION_REQUIRED, FAVORITES_REQUIRED, GENDER_REQUIRED, NAME_REQUIRED,
};
use directory_model::{Designation, Favorite, Field, FieldErrors, Gender, UserFields};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::UserApi;
use crate::cache::{CachedUser, SyncState, UserCache, temporary_id};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(CachedUser),
}

/// Raw form input.
///
/// A stored designation outside [`Designation::ALL`] is carried in
/// `unlisted_designation` and submitted unchanged until another designation
/// is picked. Unknown favorites are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    pub name: String,
    pub gender: Option<Gender>,
    pub designation: Option<Designation>,
    pub unlisted_designation: Option<String>,
    pub favorites: Vec<Favorite>,
}

impl FormData {
    pub fn from_fields(fields: &UserFields) -> Self {
        let designation: Option<Designation> = fields.designation.parse().ok();
        let unlisted_designation = match designation {
            Some(_) => None,
            None if fields.designation.trim().is_empty() => None,
            None => {
                debug!(designation = %fields.designation, "designation outside option set");
                Some(fields.designation.trim().to_string())
            }
        };

        Self {
            name: fields.name.clone(),
            gender: Some(fields.gender),
            designation,
            unlisted_designation,
            favorites: fields
                .favorites
                .iter()
                .filter_map(|fav| fav.parse().ok())
                .collect(),
        }
    }

    pub fn validate(&self) -> Result<UserFields, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.insert(Field::Name, NAME_REQUIRED);
        }
        if self.gender.is_none() {
            errors.insert(Field::Gender, GENDER_REQUIRED);
        }
        let designation = match (self.designation, &self.unlisted_designation) {
            (Some(designation), _) => Some(designation.as_str().to_string()),
            (None, Some(unlisted)) => Some(unlisted.clone()),
            (None, None) => None,
        };
        if designation.is_none() {
            errors.insert(Field::Designation, DESIGNATION_REQUIRED);
        }
        if self.favorites.is_empty() {
            errors.insert(Field::Favorites, FAVORITES_REQUIRED);
        }

        match (self.gender, designation) {
            (Some(gender), Some(designation)) if errors.is_empty() => Ok(UserFields {
                name: name.to_string(),
                gender,
                designation,
                favorites: self
                    .favorites
                    .iter()
                    .map(|fav| fav.as_str().to_string())
                    .collect(),
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created { user: CachedUser, saved_remotely: bool },
    Updated { user: CachedUser, saved_remotely: bool },
}

impl SubmitOutcome {
    pub fn user(&self) -> &CachedUser {
        match self {
            SubmitOutcome::Created { user, .. } | SubmitOutcome::Updated { user, .. } => user,
        }
    }

    pub fn saved_remotely(&self) -> bool {
        match self {
            SubmitOutcome::Created { saved_remotely, .. }
            | SubmitOutcome::Updated { saved_remotely, .. } => *saved_remotely,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            SubmitOutcome::Created { .. } => "User created successfully!",
            SubmitOutcome::Updated { .. } => "User updated successfully!",
        }
    }
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error("Please fix the errors before submitting: {0}")]
    Invalid(FieldErrors),

    #[error("a submission is already in progress")]
    Busy,
}

struct FormState {
    mode: FormMode,
    data: FormData,
    errors: FieldErrors,
}

/// Clears the submitting flag when the submit future finishes or is dropped.
struct SubmitGuard<'a>(&'a AtomicBool);

impl<'a> SubmitGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct UserForm {
    api: Arc<dyn UserApi>,
    cache: UserCache,
    state: Mutex<FormState>,
    submitting: AtomicBool,
}

impl UserForm {
    pub fn new(api: Arc<dyn UserApi>, cache: UserCache) -> Self {
        Self {
            api,
            cache,
            state: Mutex::new(FormState {
                mode: FormMode::Create,
                data: FormData::default(),
                errors: FieldErrors::new(),
            }),
            submitting: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FormState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn mode(&self) -> FormMode {
        self.lock().mode.clone()
    }

    pub fn data(&self) -> FormData {
        self.lock().data.clone()
    }

    pub fn errors(&self) -> FieldErrors {
        self.lock().errors.clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Id shown in the form header: the target's id, or `None` in create mode.
    pub fn target_id(&self) -> Option<String> {
        match &self.lock().mode {
            FormMode::Create => None,
            FormMode::Edit(target) => Some(target.id.clone()),
        }
    }

    pub fn set_editing_target(&self, target: Option<CachedUser>) {
        let mut state = self.lock();
        match target {
            Some(user) => {
                state.data = FormData::from_fields(&user.fields);
                state.mode = FormMode::Edit(user);
            }
            None => {
                state.data = FormData::default();
                state.mode = FormMode::Create;
            }
        }
        state.errors = FieldErrors::new();
    }

    pub fn set_name(&self, name: impl Into<String>) {
        let mut state = self.lock();
        state.data.name = name.into();
        state.errors.clear(Field::Name);
    }

    pub fn set_gender(&self, gender: Gender) {
        let mut state = self.lock();
        state.data.gender = Some(gender);
        state.errors.clear(Field::Gender);
    }

    pub fn set_designation(&self, designation: Designation) {
        let mut state = self.lock();
        state.data.designation = Some(designation);
        state.data.unlisted_designation = None;
        state.errors.clear(Field::Designation);
    }

    /// Checks or unchecks one favorite, keeping selection order.
    pub fn toggle_favorite(&self, favorite: Favorite) {
        let mut state = self.lock();
        let favorites = &mut state.data.favorites;
        if let Some(pos) = favorites.iter().position(|f| *f == favorite) {
            favorites.remove(pos);
        } else {
            favorites.push(favorite);
        }
        state.errors.clear(Field::Favorites);
    }

    pub fn set_favorites(&self, favorites: Vec<Favorite>) {
        let mut state = self.lock();
        state.data.favorites = Vec::new();
        for favorite in favorites {
            if !state.data.favorites.contains(&favorite) {
                state.data.favorites.push(favorite);
            }
        }
        state.errors.clear(Field::Favorites);
    }

    pub async fn submit(&self) -> Result<SubmitOutcome, FormError> {
        let _guard = SubmitGuard::acquire(&self.submitting).ok_or(FormError::Busy)?;

        let (mode, fields) = {
            let mut state = self.lock();
            match state.data.validate() {
                Ok(fields) => (state.mode.clone(), fields),
                Err(errors) => {
                    state.errors = errors.clone();
                    return Err(FormError::Invalid(errors));
                }
            }
        };

        let submitted = mode.clone();
        let outcome = match mode {
            FormMode::Create => self.create(fields).await,
            FormMode::Edit(target) => self.update(target, fields).await,
        };

        let mut state = self.lock();
        if state.mode == submitted {
            state.mode = FormMode::Create;
            state.data = FormData::default();
            state.errors = FieldErrors::new();
        } else {
            debug!("editing target changed during submit, keeping new form");
        }

        Ok(outcome)
    }

    async fn create(&self, fields: UserFields) -> SubmitOutcome {
        let (user, saved_remotely) = match self.api.create(&fields).await {
            Ok(user) => (CachedUser::synced(user), true),
            Err(e) => {
                warn!(error = %e, "API create failed, keeping user in local cache only");
                let existing = match self.cache.load() {
                    Ok(users) => users.unwrap_or_default(),
                    Err(e) => {
                        warn!(error = %e, "cache unreadable while choosing temporary id");
                        Vec::new()
                    }
                };
                (CachedUser::pending(temporary_id(&existing), fields), false)
            }
        };

        if let Err(e) = self.cache.upsert(user.clone()) {
            warn!(error = %e, id = %user.id, "failed to cache created user");
        }

        info!(id = %user.id, saved_remotely, "user created");
        SubmitOutcome::Created {
            user,
            saved_remotely,
        }
    }

    async fn update(&self, target: CachedUser, fields: UserFields) -> SubmitOutcome {
        let remote = if target.is_temporary() {
            debug!(id = %target.id, "temporary id, skipping API update");
            None
        } else {
            match self.api.update(&target.id, &fields).await {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(error = %e, id = %target.id, "API update failed, patching local cache only");
                    None
                }
            }
        };

        let saved_remotely = remote.is_some();
        let user = match remote {
            Some(user) => CachedUser::synced(user),
            None => CachedUser {
                fields,
                sync: match target.sync {
                    SyncState::Conflict => SyncState::Conflict,
                    _ => SyncState::Pending,
                },
                ..target
            },
        };

        if let Err(e) = self.cache.upsert(user.clone()) {
            warn!(error = %e, id = %user.id, "failed to cache updated user");
        }

        info!(id = %user.id, saved_remotely, "user updated");
        SubmitOutcome::Updated {
            user,
            saved_remotely,
        }
    }
}
