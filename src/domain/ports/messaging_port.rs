//! Messaging port definition.

use async_trait::async_trait;

use crate::domain::entities::{ChannelId, GuildId, MessageId};
use crate::domain::errors::DeliveryError;

/// Port for the outbound chat-platform operations the bot performs.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    /// Posts `content` to a channel.
    async fn send_reply(&self, channel_id: ChannelId, content: &str) -> Result<(), DeliveryError>;

    /// Adds the bot's reaction to a message.
    async fn add_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: &str,
    ) -> Result<(), DeliveryError>;

    /// Hides the platform-generated link previews of a message.
    async fn suppress_embeds(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), DeliveryError>;

    /// Looks up a guild's display name.
    async fn guild_name(&self, guild_id: GuildId) -> Result<String, DeliveryError>;
}
