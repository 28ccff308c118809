//! Client side of the user directory.
//!
//! [`form::UserForm`] and [`list::UserList`] hold the state of the create/edit
//! form and the searchable list. Every mutation is attempted against the API
//! first and always written to the local [`cache::UserCache`], so the client
//! keeps working while the API is down. Records written only locally are
//! marked `pending` and pushed later by [`sync::reconcile`].

pub mod api;
pub mod app;
pub mod cache;
pub mod form;
pub mod list;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{ApiError, HttpUserApi, UserApi};
pub use app::Directory;
pub use cache::{CachedUser, FileStorage, MemoryStorage, SyncState, UserCache};
pub use form::{FormData, FormError, FormMode, SubmitOutcome, UserForm};
pub use list::{DeleteOutcome, ListView, LoadOutcome, UserList};
pub use sync::{SyncReport, reconcile};
