use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use directory_model::FieldErrors;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::db::StoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("User {0} not found")]
    NotFound(String),

    #[error("Store unavailable")]
    Unavailable,

    #[error("Internal server error")]
    Internal,
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<FieldErrors>,
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(errors) => ApiError::Validation(errors),
            StoreError::NotFound(id) => ApiError::NotFound(id),
            StoreError::Connectivity(reason) => {
                warn!(%reason, "store unreachable");
                ApiError::Unavailable
            }
            other => {
                // Details stay in the log, never in the response.
                error!(error = %other, "store failure");
                ApiError::Internal
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedPayload(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MalformedPayload(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorBody {
            message: self.to_string(),
            errors: match self {
                ApiError::Validation(errors) => Some(errors),
                _ => None,
            },
        };

        (status, Json(body)).into_response()
    }
}
