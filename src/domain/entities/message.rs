use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl $name {
            /// Returns the underlying u64 value.
            #[must_use]
            pub const fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

snowflake_id!(
    /// Unique identifier for a Discord message.
    MessageId
);
snowflake_id!(
    /// Unique identifier for a Discord channel.
    ChannelId
);
snowflake_id!(
    /// Unique identifier for a Discord guild.
    GuildId
);

/// A chat message delivered to the bot, reduced to what link rewriting needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Message ID.
    pub id: MessageId,
    /// Channel the message was posted in.
    pub channel_id: ChannelId,
    /// Guild the channel belongs to. `None` for direct messages.
    pub guild_id: Option<GuildId>,
    /// Author's username.
    pub author_username: String,
    /// Whether the author is a bot account.
    pub author_is_bot: bool,
    /// Raw message text.
    pub content: String,
}

impl InboundMessage {
    /// Creates a message authored by a human user.
    #[must_use]
    pub fn new(
        id: MessageId,
        channel_id: ChannelId,
        author_username: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id,
            channel_id,
            guild_id: None,
            author_username: author_username.into(),
            author_is_bot: false,
            content: content.into(),
        }
    }

    #[must_use]
    pub const fn with_guild(mut self, guild_id: GuildId) -> Self {
        self.guild_id = Some(guild_id);
        self
    }

    #[must_use]
    pub const fn from_bot(mut self) -> Self {
        self.author_is_bot = true;
        self
    }
}
