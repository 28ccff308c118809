use directory_model::FieldErrors;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("validation failed: {0}")]
    Validation(#[from] FieldErrors),

    #[error("user {0} not found")]
    NotFound(String),

    /// Pool exhausted, closed, or the database file is unreachable.
    #[error("store unavailable: {0}")]
    Connectivity(String),

    #[error("stored user {id} is unreadable: {reason}")]
    CorruptRecord { id: String, reason: String },

    #[error("unexpected store error: {0}")]
    Unexpected(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Connectivity(err.to_string())
            }
            other => StoreError::Unexpected(other.to_string()),
        }
    }
}
