//! Upstream lookup error types.

use thiserror::Error;

/// Failure while classifying a Reddit link or resolving a short link.
///
/// Always recovered locally: the affected link is dropped and the rest of the
/// message is still processed.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ClassificationError {
    #[error("network error calling {url}: {message}")]
    Network { url: String, message: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("invalid upstream URL: {message}")]
    InvalidUrl { message: String },

    #[error("upstream authentication failed: {message}")]
    Authentication { message: String },
}

impl ClassificationError {
    /// Creates network error.
    #[must_use]
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates unexpected status error.
    #[must_use]
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::UnexpectedStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates decode error.
    #[must_use]
    pub fn decode(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates invalid URL error.
    #[must_use]
    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            message: message.into(),
        }
    }

    /// Creates authentication error.
    #[must_use]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Returns whether retrying later could succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Timeout { .. } => true,
            Self::UnexpectedStatus { status, .. } => *status == 429 || *status >= 500,
            Self::Decode { .. } | Self::InvalidUrl { .. } | Self::Authentication { .. } => false,
        }
    }
}
