use super::ChannelId;

/// Default emoji added to messages the bot replied to.
pub const DEFAULT_REACTION_EMOJI: &str = "concreteBONK:959613362612887582";

/// Default note appended when a Reddit video link was rewritten.
pub const DEFAULT_REDDIT_AUDIO_NOTE: &str =
    "-# Heads up: the rewritten Reddit embed does not include audio.";

/// Runtime behaviour of the message handler, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotSettings {
    /// Emoji reference (`name:id` for custom emoji, or a unicode emoji).
    pub reaction_emoji: String,
    /// Suppress native embeds on the source message for TikTok and Reddit links.
    pub suppress_embeds: bool,
    /// In dev mode only the dev channel is handled; otherwise it is ignored.
    pub dev_mode: bool,
    /// Channel reserved for development traffic.
    pub dev_channel_id: Option<ChannelId>,
    /// Appended to replies that contain a rewritten Reddit video.
    pub reddit_audio_note: String,
}

impl BotSettings {
    /// Returns whether a message in `channel_id` should be handled.
    #[must_use]
    pub fn accepts_channel(&self, channel_id: ChannelId) -> bool {
        let is_dev_channel = self.dev_channel_id == Some(channel_id);
        if self.dev_mode {
            is_dev_channel
        } else {
            !is_dev_channel
        }
    }
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            reaction_emoji: DEFAULT_REACTION_EMOJI.to_string(),
            suppress_embeds: true,
            dev_mode: false,
            dev_channel_id: None,
            reddit_audio_note: DEFAULT_REDDIT_AUDIO_NOTE.to_string(),
        }
    }
}
