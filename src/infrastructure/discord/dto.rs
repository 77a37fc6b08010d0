use serde::{Deserialize, Serialize};

/// `MESSAGE_SUPPRESS_EMBEDS` message flag.
pub const SUPPRESS_EMBEDS_FLAG: u64 = 1 << 2;

/// Discord error code for missing permissions.
pub const MISSING_PERMISSIONS_CODE: u64 = 50013;

/// Body of `POST /channels/{channel.id}/messages`.
#[derive(Debug, Serialize)]
pub struct CreateMessageRequest<'a> {
    pub content: &'a str,
    pub allowed_mentions: AllowedMentions,
}

impl<'a> CreateMessageRequest<'a> {
    /// Creates a message that pings nobody.
    #[must_use]
    pub fn new(content: &'a str) -> Self {
        Self {
            content,
            allowed_mentions: AllowedMentions::default(),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct AllowedMentions {
    pub parse: Vec<String>,
}

/// Body of `PATCH /channels/{channel.id}/messages/{message.id}`.
#[derive(Debug, Serialize)]
pub struct EditMessageFlagsRequest {
    pub flags: u64,
}

/// Subset of the guild object.
#[derive(Debug, Deserialize)]
pub struct GuildResponse {
    pub id: String,
    pub name: String,
}

/// Discord API error response structure.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    /// Error message from Discord.
    #[serde(default)]
    pub message: String,
    /// JSON error code, distinct from the HTTP status.
    #[serde(default)]
    pub code: u64,
    /// Seconds to wait before retrying, on 429 responses.
    #[serde(default)]
    pub retry_after: Option<f64>,
}
