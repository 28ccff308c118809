use async_trait::async_trait;
use directory_model::{User, UserFields};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API unreachable: {0}")]
    Connectivity(String),

    #[error("rejected by API: {0}")]
    Validation(String),

    #[error("user {0} not found")]
    NotFound(String),

    #[error("unexpected API response: {0}")]
    Unexpected(String),
}

/// Remote operations on the users collection.
#[async_trait]
pub trait UserApi: Send + Sync {
    async fn list(&self) -> Result<Vec<User>, ApiError>;

    async fn create(&self, fields: &UserFields) -> Result<User, ApiError>;

    async fn update(&self, id: &str, fields: &UserFields) -> Result<User, ApiError>;

    async fn delete(&self, id: &str) -> Result<(), ApiError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct HttpUserApi {
    client: Client,
    base_url: String,
}

impl HttpUserApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Unexpected(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn users_url(&self) -> String {
        format!("{}/users", self.base_url)
    }

    fn user_url(&self, id: &str) -> String {
        format!("{}/users/{}", self.base_url, id)
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_decode() {
        ApiError::Unexpected(err.to_string())
    } else {
        ApiError::Connectivity(err.to_string())
    }
}

async fn check(response: Response, id: Option<&str>) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ErrorBody>()
        .await
        .map(|body| body.message)
        .unwrap_or_else(|_| status.to_string());

    Err(match status {
        StatusCode::BAD_REQUEST => ApiError::Validation(message),
        StatusCode::NOT_FOUND => ApiError::NotFound(id.map_or(message, str::to_string)),
        StatusCode::SERVICE_UNAVAILABLE => ApiError::Connectivity(message),
        _ => ApiError::Unexpected(message),
    })
}

#[async_trait]
impl UserApi for HttpUserApi {
    async fn list(&self) -> Result<Vec<User>, ApiError> {
        let response = self
            .client
            .get(self.users_url())
            .send()
            .await
            .map_err(transport_error)?;

        check(response, None)
            .await?
            .json()
            .await
            .map_err(transport_error)
    }

    async fn create(&self, fields: &UserFields) -> Result<User, ApiError> {
        let response = self
            .client
            .post(self.users_url())
            .json(fields)
            .send()
            .await
            .map_err(transport_error)?;

        check(response, None)
            .await?
            .json()
            .await
            .map_err(transport_error)
    }

    async fn update(&self, id: &str, fields: &UserFields) -> Result<User, ApiError> {
        let response = self
            .client
            .put(self.user_url(id))
            .json(fields)
            .send()
            .await
            .map_err(transport_error)?;

        check(response, Some(id))
            .await?
            .json()
            .await
            .map_err(transport_error)
    }

    async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.user_url(id))
            .send()
            .await
            .map_err(transport_error)?;

        check(response, Some(id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_dropped() {
        let api = HttpUserApi::new("http://localhost:5000/api/").unwrap();
        assert_eq!(api.base_url(), "http://localhost:5000/api");
        assert_eq!(api.user_url("abc"), "http://localhost:5000/api/users/abc");
    }

    #[tokio::test]
    async fn closed_port_is_connectivity_error() {
        // Port 9 (discard) is almost never listening locally.
        let api = HttpUserApi::new("http://127.0.0.1:9/api").unwrap();
        let err = api.list().await.unwrap_err();
        assert!(matches!(err, ApiError::Connectivity(_)), "got {err:?}");
    }
}
