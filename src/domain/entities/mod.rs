//! Domain entity definitions.

mod message;
mod rewrite;
mod settings;
mod token;

pub use message::{ChannelId, GuildId, InboundMessage, MessageId};
pub use rewrite::{CachedValue, RedirectResolution, RewriteResult, VideoVerdict};
pub use settings::{BotSettings, DEFAULT_REACTION_EMOJI, DEFAULT_REDDIT_AUDIO_NOTE};
pub use token::{BotToken, Secret};
