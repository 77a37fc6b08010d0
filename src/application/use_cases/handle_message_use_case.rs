//! Inbound message handling.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::application::services::LinkRewriter;
use crate::domain::entities::{BotSettings, InboundMessage};
use crate::domain::errors::DeliveryError;
use crate::domain::ports::MessagingPort;

/// What happened to one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    /// Sent by a bot.
    IgnoredBot,
    /// Posted in a channel excluded by the dev-mode setting.
    IgnoredChannel,
    /// No link needed rewriting.
    NoLinks,
    /// Shutdown began before the rewrite finished; nothing was sent.
    Cancelled,
    /// A reply was sent.
    Replied { links: usize, suppressed: bool },
}

/// Rewrites the links of a message and replies with the result.
#[derive(Clone)]
pub struct HandleMessageUseCase {
    rewriter: LinkRewriter,
    messaging: Arc<dyn MessagingPort>,
    settings: BotSettings,
}

impl HandleMessageUseCase {
    #[must_use]
    pub fn new(
        rewriter: LinkRewriter,
        messaging: Arc<dyn MessagingPort>,
        settings: BotSettings,
    ) -> Self {
        Self {
            rewriter,
            messaging,
            settings,
        }
    }

    /// Handles one message.
    ///
    /// Once the reply is sent, the reaction and embed suppression follow
    /// even if `cancel` fires in between.
    ///
    /// # Errors
    /// Returns error if the reply, reaction or embed suppression is rejected.
    /// Missing permissions for the suppression are logged, not returned.
    pub async fn execute(
        &self,
        message: &InboundMessage,
        cancel: &CancellationToken,
    ) -> Result<HandleOutcome, DeliveryError> {
        if message.author_is_bot {
            return Ok(HandleOutcome::IgnoredBot);
        }

        if !self.settings.accepts_channel(message.channel_id) {
            debug!(channel_id = %message.channel_id, "Ignoring message outside handled channels");
            return Ok(HandleOutcome::IgnoredChannel);
        }

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(message_id = %message.id, "Rewrite abandoned on shutdown");
                return Ok(HandleOutcome::Cancelled);
            }
            result = self.rewriter.rewrite(&message.content) => result,
        };

        if result.is_empty() {
            return Ok(HandleOutcome::NoLinks);
        }

        let reply = result.render_reply(&self.settings.reddit_audio_note);
        self.messaging
            .send_reply(message.channel_id, &reply)
            .await
            .inspect_err(|e| error!(channel_id = %message.channel_id, error = %e, "Error sending message"))?;

        info!(
            author = %message.author_username,
            channel_id = %message.channel_id,
            links = result.links().len(),
            "Replied with rewritten links"
        );

        self.messaging
            .add_reaction(message.channel_id, message.id, &self.settings.reaction_emoji)
            .await
            .inspect_err(|e| {
                error!(
                    message_id = %message.id,
                    emoji = %self.settings.reaction_emoji,
                    error = %e,
                    "Error adding reaction"
                );
            })?;

        let suppressed = if self.settings.suppress_embeds && result.should_suppress_native_embed() {
            self.suppress_embeds(message).await?
        } else {
            false
        };

        Ok(HandleOutcome::Replied {
            links: result.links().len(),
            suppressed,
        })
    }

    async fn suppress_embeds(&self, message: &InboundMessage) -> Result<bool, DeliveryError> {
        match self
            .messaging
            .suppress_embeds(message.channel_id, message.id)
            .await
        {
            Ok(()) => {
                debug!(message_id = %message.id, "Suppressed native embeds");
                Ok(true)
            }
            Err(e) if e.is_permission_error() => {
                let guild = match message.guild_id {
                    Some(guild_id) => match self.messaging.guild_name(guild_id).await {
                        Ok(name) => name,
                        Err(lookup) => {
                            warn!(guild_id = %guild_id, error = %lookup, "Error looking up guild");
                            guild_id.to_string()
                        }
                    },
                    None => "direct message".to_string(),
                };
                warn!(guild = %guild, channel_id = %message.channel_id, "Missing permissions to suppress embeds");
                Ok(false)
            }
            Err(e) => {
                error!(message_id = %message.id, error = %e, "Error suppressing embeds");
                Err(e)
            }
        }
    }
}
