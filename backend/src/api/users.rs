use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use directory_model::{User, UserDraft, UserPatch};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::api::error::ApiError;
use crate::api::server::AppState;
use crate::db::repo;

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
    pub id: String,
}

pub async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<User>>, ApiError> {
    let users = repo::list_users(&state.db).await?;
    Ok(Json(users))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UserDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let Json(draft) = payload?;
    let user = repo::insert_user(&state.db, draft).await?;

    info!(id = %user.id, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let user = repo::get_user(&state.db, &id).await?;
    Ok(Json(user))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UserPatch>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let Json(patch) = payload?;
    let user = repo::update_user(&state.db, &id, patch).await?;

    info!(%id, "user updated");
    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    repo::delete_user(&state.db, &id).await?;

    info!(%id, "user deleted");
    Ok(Json(DeleteResponse {
        message: "User deleted successfully".to_string(),
        id,
    }))
}
