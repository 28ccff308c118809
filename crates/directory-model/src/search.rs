//! In-memory search over user records.

use crate::user::{User, UserFields};

/// Anything that carries a user field set can be searched.
pub trait Searchable {
    fn fields(&self) -> &UserFields;
}

impl Searchable for UserFields {
    fn fields(&self) -> &UserFields {
        self
    }
}

impl Searchable for User {
    fn fields(&self) -> &UserFields {
        &self.fields
    }
}

/// Case-insensitive substring match on name, designation, gender or any
/// favorite. A blank term matches everything.
pub fn matches_term(fields: &UserFields, term: &str) -> bool {
    if term.trim().is_empty() {
        return true;
    }
    let needle = term.to_lowercase();

    fields.name.to_lowercase().contains(&needle)
        || fields.designation.to_lowercase().contains(&needle)
        || fields.gender.as_str().to_lowercase().contains(&needle)
        || fields
            .favorites
            .iter()
            .any(|fav| fav.to_lowercase().contains(&needle))
}

pub fn filter_users<T: Searchable + Clone>(users: &[T], term: &str) -> Vec<T> {
    users
        .iter()
        .filter(|user| matches_term(user.fields(), term))
        .cloned()
        .collect()
}
