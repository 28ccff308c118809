//! Record types shared by the user-directory backend and client.
//!
//! The option sets for designations and favorites live here so both the
//! client form and any server-side check read the same list.

pub mod options;
pub mod search;
pub mod user;
pub mod validation;

pub use options::{Designation, Favorite, UnknownOption};
pub use search::{Searchable, filter_users, matches_term};
pub use user::{Gender, User, UserDraft, UserFields, UserPatch};
pub use validation::{Field, FieldErrors};
