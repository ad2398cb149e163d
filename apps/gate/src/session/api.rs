use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::credential::{BearerToken, TOKEN_NAME};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Session API returned status {status}")]
    Status { status: u16 },

    #[error("Malformed session API response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Session API call timed out")]
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
}

/// Body of `GET /auth/verify-admin`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyAdminResponse {
    pub is_admin: bool,
    #[serde(default)]
    pub user: Option<AdminUser>,
}

/// Backend collaborator for admin verification and sign-out.
#[async_trait]
pub trait SessionApi: Send + Sync {
    async fn verify_admin(
        &self,
        token: Option<&BearerToken>,
    ) -> Result<VerifyAdminResponse, SessionError>;

    async fn logout(&self, token: Option<&BearerToken>) -> Result<(), SessionError>;
}

/// Reqwest-backed [`SessionApi`]. The token travels as the `token` cookie,
/// exactly as a browser would send it.
#[derive(Clone)]
pub struct HttpSessionApi {
    client: Client,
    base_url: String,
}

impl HttpSessionApi {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }
}

fn with_token(
    request: reqwest::RequestBuilder,
    token: Option<&BearerToken>,
) -> reqwest::RequestBuilder {
    match token {
        Some(token) => request.header(
            header::COOKIE,
            format!("{TOKEN_NAME}={}", token.as_str()),
        ),
        None => request,
    }
}

fn ensure_success(status: StatusCode) -> Result<(), SessionError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(SessionError::Status {
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl SessionApi for HttpSessionApi {
    async fn verify_admin(
        &self,
        token: Option<&BearerToken>,
    ) -> Result<VerifyAdminResponse, SessionError> {
        let response = with_token(self.client.get(self.endpoint("/auth/verify-admin")), token)
            .send()
            .await?;
        ensure_success(response.status())?;

        let body = response.bytes().await?;
        let verified: VerifyAdminResponse = serde_json::from_slice(&body)?;
        debug!(is_admin = verified.is_admin, "Admin verification answered");
        Ok(verified)
    }

    async fn logout(&self, token: Option<&BearerToken>) -> Result<(), SessionError> {
        let response = with_token(self.client.post(self.endpoint("/auth/logout")), token)
            .send()
            .await?;
        ensure_success(response.status())
    }
}
