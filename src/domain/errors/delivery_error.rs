//! Messaging delivery error types.

use thiserror::Error;

/// Failure while talking back to the chat platform.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum DeliveryError {
    #[error("missing permissions: {message}")]
    MissingPermissions { message: String },

    #[error("rate limited by Discord, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("network error talking to Discord: {message}")]
    Network { message: String },

    #[error("Discord rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected delivery error: {message}")]
    Unexpected { message: String },
}

impl DeliveryError {
    /// Creates missing permissions error.
    #[must_use]
    pub fn missing_permissions(message: impl Into<String>) -> Self {
        Self::MissingPermissions {
            message: message.into(),
        }
    }

    /// Creates network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates rejected error.
    #[must_use]
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Creates unexpected error.
    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    /// Returns whether the bot lacks a guild permission for the action.
    #[must_use]
    pub const fn is_permission_error(&self) -> bool {
        matches!(self, Self::MissingPermissions { .. })
    }
}
