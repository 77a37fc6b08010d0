//! Discord API HTTP client.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, header};
use tracing::{debug, warn};

use super::dto::{
    CreateMessageRequest, EditMessageFlagsRequest, ErrorResponse, GuildResponse,
    MISSING_PERMISSIONS_CODE, SUPPRESS_EMBEDS_FLAG,
};
use crate::domain::entities::{BotToken, ChannelId, GuildId, MessageId};
use crate::domain::errors::DeliveryError;
use crate::domain::ports::MessagingPort;

pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";
const USER_AGENT: &str = concat!(
    "DiscordBot (embedfix, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// Discord REST client authenticated as a bot.
pub struct DiscordRestClient {
    client: Client,
    base_url: String,
    authorization: String,
}

impl DiscordRestClient {
    /// Creates new client with default base URL.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn new(token: &BotToken) -> Result<Self, DeliveryError> {
        Self::with_base_url(token, DISCORD_API_BASE)
    }

    /// Creates client with custom base URL.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn with_base_url(token: &BotToken, base_url: impl Into<String>) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| DeliveryError::unexpected(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            authorization: token.authorization(),
        })
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, DeliveryError> {
        let response = request
            .header(header::AUTHORIZATION, &self.authorization)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to connect to Discord API");
                if e.is_timeout() {
                    DeliveryError::network("request timed out")
                } else if e.is_connect() {
                    DeliveryError::network("failed to connect to Discord")
                } else {
                    DeliveryError::network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.json::<ErrorResponse>().await.ok();
        Err(classify_error(status, body))
    }
}

fn classify_error(status: StatusCode, body: Option<ErrorResponse>) -> DeliveryError {
    let (message, code, retry_after) = match body {
        Some(error) => (error.message, error.code, error.retry_after),
        None => (format!("HTTP {status}"), 0, None),
    };

    if status == StatusCode::FORBIDDEN || code == MISSING_PERMISSIONS_CODE {
        return DeliveryError::missing_permissions(message);
    }

    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let retry_after_ms = retry_after.map_or(5000, |secs| (secs * 1000.0) as u64);
            DeliveryError::RateLimited { retry_after_ms }
        }
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            DeliveryError::network("Discord API is temporarily unavailable")
        }
        _ if status.is_client_error() => DeliveryError::rejected(status.as_u16(), message),
        _ => DeliveryError::unexpected(format!("unexpected response: {status} - {message}")),
    }
}

fn encode_emoji(emoji: &str) -> String {
    url::form_urlencoded::byte_serialize(emoji.as_bytes()).collect()
}

#[async_trait]
impl MessagingPort for DiscordRestClient {
    async fn send_reply(&self, channel_id: ChannelId, content: &str) -> Result<(), DeliveryError> {
        let url = format!("{}/channels/{channel_id}/messages", self.base_url);
        debug!(channel_id = %channel_id, "Sending message");

        self.send(self.client.post(&url).json(&CreateMessageRequest::new(content)))
            .await?;
        Ok(())
    }

    async fn add_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: &str,
    ) -> Result<(), DeliveryError> {
        let url = format!(
            "{}/channels/{channel_id}/messages/{message_id}/reactions/{}/@me",
            self.base_url,
            encode_emoji(emoji)
        );
        debug!(message_id = %message_id, emoji, "Adding reaction");

        self.send(self.client.put(&url).header(header::CONTENT_LENGTH, 0))
            .await?;
        Ok(())
    }

    async fn suppress_embeds(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), DeliveryError> {
        let url = format!("{}/channels/{channel_id}/messages/{message_id}", self.base_url);
        debug!(message_id = %message_id, "Suppressing embeds");

        self.send(self.client.patch(&url).json(&EditMessageFlagsRequest {
            flags: SUPPRESS_EMBEDS_FLAG,
        }))
        .await?;
        Ok(())
    }

    async fn guild_name(&self, guild_id: GuildId) -> Result<String, DeliveryError> {
        let url = format!("{}/guilds/{guild_id}", self.base_url);

        let guild: GuildResponse = self
            .send(self.client.get(&url))
            .await?
            .json()
            .await
            .map_err(|e| DeliveryError::unexpected(format!("failed to parse guild: {e}")))?;

        debug!(guild_id = %guild.id, name = %guild.name, "Fetched guild");
        Ok(guild.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> BotToken {
        BotToken::new_unchecked("MTIzNDU2Nzg5MDEyMzQ1Njc4OQ.XXXXXX.YYYYYYYYYYYYYYYYYYYYYYYYYYYY")
    }

    fn error(message: &str, code: u64) -> Option<ErrorResponse> {
        Some(ErrorResponse {
            message: message.to_string(),
            code,
            retry_after: None,
        })
    }

    #[test]
    fn test_client_creation() {
        let client = DiscordRestClient::new(&token());
        assert!(client.is_ok());
        assert!(client.unwrap().authorization.starts_with("Bot "));
    }

    #[test]
    fn test_forbidden_is_permission_error() {
        let e = classify_error(StatusCode::FORBIDDEN, error("Missing Permissions", MISSING_PERMISSIONS_CODE));
        assert!(e.is_permission_error());

        let e = classify_error(StatusCode::FORBIDDEN, None);
        assert!(e.is_permission_error());
    }

    #[test]
    fn test_missing_permissions_code_is_permission_error() {
        let e = classify_error(StatusCode::BAD_REQUEST, error("Missing Permissions", 50013));
        assert!(e.is_permission_error());
    }

    #[test]
    fn test_rate_limit_uses_retry_after() {
        let body = Some(ErrorResponse {
            message: "You are being rate limited.".to_string(),
            code: 0,
            retry_after: Some(1.5),
        });
        let e = classify_error(StatusCode::TOO_MANY_REQUESTS, body);
        assert!(matches!(e, DeliveryError::RateLimited { retry_after_ms: 1500 }));
    }

    #[test]
    fn test_unknown_emoji_rejected() {
        let e = classify_error(StatusCode::BAD_REQUEST, error("Unknown Emoji", 10014));
        assert!(matches!(e, DeliveryError::Rejected { status: 400, .. }));
        assert!(!e.is_permission_error());
    }

    #[test]
    fn test_encode_emoji() {
        assert_eq!(
            encode_emoji("concreteBONK:959613362612887582"),
            "concreteBONK%3A959613362612887582"
        );
        assert_eq!(encode_emoji("👍"), "%F0%9F%91%8D");
    }
}
