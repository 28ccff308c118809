use chrono::Utc;
use directory_model::{User, UserDraft, UserPatch};
use sqlx::types::Json;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use tracing::debug;
use uuid::Uuid;

use crate::db::StoreError;
use crate::db::models::UserRow;

const SELECT_USER: &str = r#"
    SELECT id, name, gender, designation, favorites, created_at, updated_at
    FROM users
"#;

pub async fn connect(db_url: &str) -> Result<SqlitePool, StoreError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await?;
    create_user_table(&pool).await?;
    Ok(pool)
}

/// Single-connection in-memory store. The database lives only as long as an
/// open connection to it, so the pool keeps its one connection pinned.
pub async fn connect_in_memory() -> Result<SqlitePool, StoreError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    create_user_table(&pool).await?;
    Ok(pool)
}

pub async fn create_user_table(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            gender TEXT NOT NULL,
            designation TEXT NOT NULL,
            favorites TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>, StoreError> {
    let rows = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} ORDER BY rowid"))
        .fetch_all(pool)
        .await?;

    rows.into_iter().map(User::try_from).collect()
}

pub async fn get_user(pool: &SqlitePool, id: &str) -> Result<User, StoreError> {
    sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(id.to_string()))
        .and_then(User::try_from)
}

/// Validates the draft and inserts it under a freshly generated id. Nothing
/// is written when validation fails.
pub async fn insert_user(pool: &SqlitePool, draft: UserDraft) -> Result<User, StoreError> {
    let fields = draft.validate()?;
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().simple().to_string(),
        fields,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO users (id, name, gender, designation, favorites, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&user.fields.name)
    .bind(user.fields.gender.as_str())
    .bind(&user.fields.designation)
    .bind(Json(&user.fields.favorites))
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(pool)
    .await?;

    debug!(id = %user.id, "user inserted");
    Ok(user)
}

pub async fn update_user(
    pool: &SqlitePool,
    id: &str,
    patch: UserPatch,
) -> Result<User, StoreError> {
    let current = get_user(pool, id).await?;
    let fields = patch.apply(&current.fields)?;
    let updated_at = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE users
        SET name = ?, gender = ?, designation = ?, favorites = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&fields.name)
    .bind(fields.gender.as_str())
    .bind(&fields.designation)
    .bind(Json(&fields.favorites))
    .bind(updated_at)
    .bind(id)
    .execute(pool)
    .await?;

    // Deleted between the read and the write.
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(id.to_string()));
    }

    Ok(User {
        id: current.id,
        fields,
        created_at: current.created_at,
        updated_at,
    })
}

pub async fn delete_user(pool: &SqlitePool, id: &str) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(id.to_string()));
    }

    debug!(%id, "user deleted");
    Ok(())
}
