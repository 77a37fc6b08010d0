//! Reddit password-grant token acquisition.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::entities::Secret;
use crate::domain::errors::ClassificationError;

/// Reddit's OAuth token endpoint.
pub const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Failure while obtaining a Reddit access token.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum RedditAuthError {
    #[error("token request failed: {message}")]
    Request { message: String },

    #[error("token request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid token response: {message}")]
    InvalidResponse { message: String },
}

impl From<RedditAuthError> for ClassificationError {
    fn from(e: RedditAuthError) -> Self {
        Self::authentication(e.to_string())
    }
}

/// Script-app credentials for the password grant.
#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: Secret,
    pub username: String,
    pub password: Secret,
}

impl RedditCredentials {
    /// Returns credentials only when every part is present.
    #[must_use]
    pub fn complete(
        client_id: Option<String>,
        client_secret: Option<Secret>,
        username: Option<String>,
        password: Option<Secret>,
    ) -> Option<Self> {
        let credentials = Self {
            client_id: client_id.filter(|s| !s.is_empty())?,
            client_secret: client_secret.filter(|s| !s.is_empty())?,
            username: username.filter(|s| !s.is_empty())?,
            password: password.filter(|s| !s.is_empty())?,
        };
        Some(credentials)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    expires_in: u64,
    #[serde(default)]
    error: Option<String>,
}

struct CachedToken {
    value: Secret,
    refresh_at: Instant,
}

/// Fetches and reuses a bearer token until shortly before it expires.
pub struct RedditTokenProvider {
    client: Client,
    credentials: RedditCredentials,
    token_url: String,
    cached: Mutex<Option<CachedToken>>,
}

impl RedditTokenProvider {
    #[must_use]
    pub fn new(client: Client, credentials: RedditCredentials) -> Self {
        Self {
            client,
            credentials,
            token_url: TOKEN_URL.to_string(),
            cached: Mutex::new(None),
        }
    }

    /// Returns a valid access token, requesting a new one when needed.
    ///
    /// # Errors
    /// Returns error if the token endpoint fails or refuses the credentials.
    pub async fn bearer_token(&self) -> Result<Secret, RedditAuthError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref()
            && Instant::now() < token.refresh_at
        {
            return Ok(token.value.clone());
        }

        let token = self.request_token().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn request_token(&self) -> Result<CachedToken, RedditAuthError> {
        debug!(token_url = %self.token_url, username = %self.credentials.username, "Requesting Reddit token");

        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(
                &self.credentials.client_id,
                Some(self.credentials.client_secret.expose()),
            )
            .form(&[
                ("grant_type", "password"),
                ("username", self.credentials.username.as_str()),
                ("password", self.credentials.password.expose()),
            ])
            .send()
            .await
            .map_err(|e| RedditAuthError::Request {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RedditAuthError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: TokenResponse =
            response
                .json()
                .await
                .map_err(|e| RedditAuthError::InvalidResponse {
                    message: e.to_string(),
                })?;

        let token = parse_token(body, Instant::now())?;
        info!("Obtained Reddit access token");
        Ok(token)
    }
}

fn parse_token(body: TokenResponse, now: Instant) -> Result<CachedToken, RedditAuthError> {
    // Reddit reports bad credentials as 200 with an `error` field.
    if let Some(error) = body.error {
        return Err(RedditAuthError::Rejected {
            status: 401,
            message: error,
        });
    }
    if body.access_token.is_empty() {
        return Err(RedditAuthError::InvalidResponse {
            message: "missing access_token".to_string(),
        });
    }

    let lifetime = Duration::from_secs(body.expires_in).saturating_sub(EXPIRY_MARGIN);
    Ok(CachedToken {
        value: Secret::new(body.access_token),
        refresh_at: now + lifetime,
    })
}
