//! Upstream content API port definition.

use async_trait::async_trait;
use url::Url;

use crate::domain::errors::ClassificationError;

/// Minimal view of an upstream HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    /// HTTP status code.
    pub status: u16,
    /// `Location` header, when present.
    pub location: Option<String>,
    /// Response body. Empty for `HEAD` requests.
    pub body: String,
}

impl UpstreamResponse {
    /// Creates a response with a body and no `Location` header.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            location: None,
            body: body.into(),
        }
    }

    /// Creates a bodiless redirect response.
    #[must_use]
    pub fn redirect(status: u16, location: impl Into<String>) -> Self {
        Self {
            status,
            location: Some(location.into()),
            body: String::new(),
        }
    }

    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Port for calls to the upstream content API.
///
/// Implementations send browser-like `User-Agent` and `Accept-Language`
/// headers and apply a bounded timeout.
#[async_trait]
pub trait UpstreamHttpPort: Send + Sync {
    /// Issues a `GET`, following redirects.
    async fn get(&self, url: &Url) -> Result<UpstreamResponse, ClassificationError>;

    /// Issues a `HEAD` without following redirects.
    async fn head_without_redirect(&self, url: &Url)
    -> Result<UpstreamResponse, ClassificationError>;
}
