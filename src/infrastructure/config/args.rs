use std::path::PathBuf;

use clap::Parser;
use clap::builder::BoolishValueParser;

use super::app_config::LogLevel;
use crate::application::services::ShortLinkStrategy;

#[derive(Debug, Parser)]
#[command(
    name = "embedfix",
    version,
    about = "Discord bot that reposts Instagram, TikTok and Reddit links with working embeds",
    long_about = None
)]
pub struct CliArgs {
    /// Discord bot token.
    #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true)]
    pub discord_token: Option<String>,

    /// Configuration file path.
    #[arg(short, long, value_name = "PATH", env = "EMBEDFIX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH", env = "LOG_PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum, ignore_case = true, env = "LOG_LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Deployment environment (`dev` or `prod`).
    #[arg(long, env = "ENV")]
    pub environment: Option<String>,

    /// Emoji added to handled messages (`name:id` or unicode).
    #[arg(long, env = "REACTION_EMOJI")]
    pub reaction_emoji: Option<String>,

    /// Suppress native embeds for TikTok links and Reddit videos.
    #[arg(long, env = "ENABLE_TIKTOK_EMBED_SUPPRESSION", value_parser = BoolishValueParser::new())]
    pub suppress_embeds: Option<bool>,

    /// Channel handled only in the dev environment.
    #[arg(long, env = "DEV_CHANNEL_ID")]
    pub dev_channel_id: Option<u64>,

    /// Reddit account username.
    #[arg(long, env = "REDDIT_USERNAME")]
    pub reddit_username: Option<String>,

    /// Reddit account password.
    #[arg(long, env = "REDDIT_PASSWORD", hide_env_values = true)]
    pub reddit_password: Option<String>,

    /// Reddit script app client id.
    #[arg(long, env = "REDDIT_CLIENT_ID")]
    pub reddit_client_id: Option<String>,

    /// Reddit script app secret.
    #[arg(long, env = "REDDIT_SECRET", hide_env_values = true)]
    pub reddit_secret: Option<String>,

    /// How `v.redd.it` links are resolved.
    #[arg(long, value_enum, env = "REDDIT_SHORT_LINK_STRATEGY")]
    pub short_link_strategy: Option<ShortLinkStrategy>,
}
