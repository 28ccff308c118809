use chrono::{DateTime, Utc};
use directory_model::{Gender, User, UserFields};
use sqlx::types::Json;

use crate::db::StoreError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub gender: String,
    pub designation: String,
    pub favorites: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let gender = row
            .gender
            .parse::<Gender>()
            .map_err(|e| StoreError::CorruptRecord {
                id: row.id.clone(),
                reason: e.to_string(),
            })?;

        Ok(User {
            id: row.id,
            fields: UserFields {
                name: row.name,
                gender,
                designation: row.designation,
                favorites: row.favorites.0,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
