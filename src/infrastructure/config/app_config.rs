//! Application configuration.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use super::args::CliArgs;
use super::loader::ConfigError;
use crate::application::ResolverSettings;
use crate::application::services::ShortLinkStrategy;
use crate::domain::entities::{
    BotSettings, BotToken, ChannelId, DEFAULT_REACTION_EMOJI, DEFAULT_REDDIT_AUDIO_NOTE, Secret,
};
use crate::infrastructure::cache::DEFAULT_MAX_COST;
use crate::infrastructure::reddit::{
    DEFAULT_ACCEPT_LANGUAGE, DEFAULT_USER_AGENT, RedditCredentials, UpstreamClientConfig,
};

const APP_NAME: &str = "embedfix";
const APP_QUALIFIER: &str = "gg";
const APP_ORGANIZATION: &str = "embedfix";

/// Channel reserved for development traffic unless configured otherwise.
pub const DEFAULT_DEV_CHANNEL_ID: u64 = 1_197_329_348_051_611_690;

/// Default Reddit account used for authenticated requests.
pub const DEFAULT_REDDIT_USERNAME: &str = "USL_Bot";

/// Log level configuration.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Converts to tracing level.
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Prod,
    Dev,
}

impl Environment {
    /// Parses an environment name. Anything other than `dev` is production.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("dev") {
            Self::Dev
        } else {
            Self::Prod
        }
    }

    #[must_use]
    pub const fn is_dev(self) -> bool {
        matches!(self, Self::Dev)
    }
}

/// Reddit upstream configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditConfig {
    #[serde(default = "default_reddit_username")]
    pub username: String,

    #[serde(default, skip_serializing)]
    pub password: Option<Secret>,

    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default, skip_serializing)]
    pub client_secret: Option<Secret>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    /// How `v.redd.it` links are resolved.
    #[serde(default)]
    pub short_link_strategy: ShortLinkStrategy,

    /// Cache "not a video" verdicts.
    #[serde(default = "default_true")]
    pub cache_negative_verdicts: bool,

    /// Upstream request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            username: default_reddit_username(),
            password: None,
            client_id: None,
            client_secret: None,
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            short_link_strategy: ShortLinkStrategy::default(),
            cache_negative_verdicts: true,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Result cache limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_max_cost")]
    pub max_cost: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_cost: DEFAULT_MAX_COST,
        }
    }
}

/// Application configuration: the config file merged with CLI arguments
/// and environment variables.
#[derive(Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Bot token. Only accepted from the command line or environment.
    #[serde(skip)]
    pub discord_token: Option<Secret>,

    /// Log file path. Logs go to stdout when unset.
    #[serde(default)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    #[serde(default)]
    pub environment: Environment,

    /// Emoji added to messages the bot replied to.
    #[serde(default = "default_reaction_emoji")]
    pub reaction_emoji: String,

    /// Suppress native embeds for TikTok links and Reddit videos.
    #[serde(default = "default_true")]
    pub suppress_embeds: bool,

    #[serde(default = "default_dev_channel_id")]
    pub dev_channel_id: Option<u64>,

    #[serde(default = "default_reddit_audio_note")]
    pub reddit_audio_note: String,

    #[serde(default)]
    pub reddit: RedditConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

fn default_true() -> bool {
    true
}

fn default_reaction_emoji() -> String {
    DEFAULT_REACTION_EMOJI.to_string()
}

#[allow(clippy::unnecessary_wraps)]
fn default_dev_channel_id() -> Option<u64> {
    Some(DEFAULT_DEV_CHANNEL_ID)
}

fn default_reddit_audio_note() -> String {
    DEFAULT_REDDIT_AUDIO_NOTE.to_string()
}

fn default_reddit_username() -> String {
    DEFAULT_REDDIT_USERNAME.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_accept_language() -> String {
    DEFAULT_ACCEPT_LANGUAGE.to_string()
}

/// Floor for the upstream request timeout; zero would fail every request.
const MIN_REQUEST_TIMEOUT_SECS: u64 = 1;

fn default_request_timeout() -> u64 {
    30
}

fn default_max_cost() -> u64 {
    DEFAULT_MAX_COST
}

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: CliArgs) {
        if let Some(config_path) = args.config {
            self.config = Some(config_path);
        }
        if let Some(token) = args.discord_token.filter(|t| !t.trim().is_empty()) {
            self.discord_token = Some(Secret::new(token));
        }
        if let Some(log_path) = args.log_path {
            self.log_path = Some(log_path);
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(environment) = args.environment {
            self.environment = Environment::from_name(&environment);
        }
        if let Some(emoji) = args.reaction_emoji.filter(|e| !e.is_empty()) {
            self.reaction_emoji = emoji;
        }
        if let Some(suppress) = args.suppress_embeds {
            self.suppress_embeds = suppress;
        }
        if let Some(channel_id) = args.dev_channel_id {
            self.dev_channel_id = Some(channel_id);
        }
        if let Some(username) = args.reddit_username.filter(|u| !u.is_empty()) {
            self.reddit.username = username;
        }
        if let Some(password) = args.reddit_password {
            self.reddit.password = Some(Secret::new(password));
        }
        if let Some(client_id) = args.reddit_client_id {
            self.reddit.client_id = Some(client_id);
        }
        if let Some(secret) = args.reddit_secret {
            self.reddit.client_secret = Some(Secret::new(secret));
        }
        if let Some(strategy) = args.short_link_strategy {
            self.reddit.short_link_strategy = strategy;
        }
    }

    /// Returns the validated bot token.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the token is missing or malformed.
    pub fn bot_token(&self) -> Result<BotToken, ConfigError> {
        let token = self
            .discord_token
            .as_ref()
            .ok_or(ConfigError::MissingToken)?;
        BotToken::new(token.expose()).ok_or(ConfigError::InvalidToken)
    }

    /// Log level after applying the environment. Dev runs at least at debug.
    #[must_use]
    pub fn effective_log_level(&self) -> LogLevel {
        if self.environment.is_dev() {
            self.log_level.min(LogLevel::Debug)
        } else {
            self.log_level
        }
    }

    /// Handler settings derived from this configuration.
    #[must_use]
    pub fn bot_settings(&self) -> BotSettings {
        BotSettings {
            reaction_emoji: self.reaction_emoji.clone(),
            suppress_embeds: self.suppress_embeds,
            dev_mode: self.environment.is_dev(),
            dev_channel_id: self.dev_channel_id.map(ChannelId),
            reddit_audio_note: self.reddit_audio_note.clone(),
        }
    }

    #[must_use]
    pub const fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            short_link_strategy: self.reddit.short_link_strategy,
            cache_negative_verdicts: self.reddit.cache_negative_verdicts,
        }
    }

    #[must_use]
    pub fn upstream_config(&self) -> UpstreamClientConfig {
        UpstreamClientConfig {
            user_agent: self.reddit.user_agent.clone(),
            accept_language: self.reddit.accept_language.clone(),
            timeout: Duration::from_secs(
                self.reddit.request_timeout_secs.max(MIN_REQUEST_TIMEOUT_SECS),
            ),
        }
    }

    /// Reddit credentials, present only when every part is configured.
    #[must_use]
    pub fn reddit_credentials(&self) -> Option<RedditCredentials> {
        RedditCredentials::complete(
            self.reddit.client_id.clone(),
            self.reddit.client_secret.clone(),
            Some(self.reddit.username.clone()),
            self.reddit.password.clone(),
        )
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default config file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Returns effective config path.
    #[must_use]
    pub fn effective_config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(Self::default_config_path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config: None,
            discord_token: None,
            log_path: None,
            log_level: LogLevel::Info,
            environment: Environment::Prod,
            reaction_emoji: default_reaction_emoji(),
            suppress_embeds: true,
            dev_channel_id: default_dev_channel_id(),
            reddit_audio_note: default_reddit_audio_note(),
            reddit: RedditConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use test_case::test_case;

    use super::*;

    #[test]
    fn test_parse_config_file() {
        let toml_content = r#"
            environment = "dev"
            reaction_emoji = "👍"
            suppress_embeds = false

            [reddit]
            client_id = "abc"
            client_secret = "shh"
            password = "hunter2"
            short_link_strategy = "search"

            [cache]
            max_cost = 500
        "#;

        let config: AppConfig = toml::from_str(toml_content).expect("Failed to parse config");

        assert_eq!(config.environment, Environment::Dev);
        assert_eq!(config.reaction_emoji, "👍");
        assert!(!config.suppress_embeds);
        assert_eq!(config.reddit.username, DEFAULT_REDDIT_USERNAME);
        assert_eq!(config.reddit.short_link_strategy, ShortLinkStrategy::Search);
        assert_eq!(config.cache.max_cost, 500);
        assert!(config.reddit_credentials().is_some());
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert!(config.discord_token.is_none());
        assert!(config.suppress_embeds);
        assert_eq!(config.dev_channel_id, Some(DEFAULT_DEV_CHANNEL_ID));
        assert_eq!(config.reaction_emoji, DEFAULT_REACTION_EMOJI);
        assert!(config.reddit_credentials().is_none());
        assert_eq!(config.resolver_settings(), ResolverSettings::default());
    }

    #[test]
    fn test_serialized_default_omits_secrets() {
        let mut config = AppConfig::default();
        config.reddit.password = Some(Secret::new("hunter2"));

        let rendered = toml::to_string_pretty(&config).unwrap();
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("reaction_emoji"));
    }

    #[test_case(0, 1 ; "zero is raised to the minimum")]
    #[test_case(1, 1 ; "minimum")]
    #[test_case(45, 45 ; "configured")]
    fn test_request_timeout_has_a_floor(configured: u64, expected: u64) {
        let mut config = AppConfig::default();
        config.reddit.request_timeout_secs = configured;

        assert_eq!(config.upstream_config().timeout, Duration::from_secs(expected));
    }

    #[test_case("dev", Environment::Dev ; "lowercase")]
    #[test_case("DEV", Environment::Dev ; "uppercase")]
    #[test_case("prod", Environment::Prod ; "prod")]
    #[test_case("staging", Environment::Prod ; "unknown is prod")]
    fn test_environment_from_name(name: &str, expected: Environment) {
        assert_eq!(Environment::from_name(name), expected);
    }

    #[test_case(Environment::Prod, LogLevel::Info, LogLevel::Info ; "prod keeps level")]
    #[test_case(Environment::Dev, LogLevel::Info, LogLevel::Debug ; "dev raises to debug")]
    #[test_case(Environment::Dev, LogLevel::Trace, LogLevel::Trace ; "dev keeps trace")]
    fn test_effective_log_level(environment: Environment, level: LogLevel, expected: LogLevel) {
        let config = AppConfig {
            environment,
            log_level: level,
            ..AppConfig::default()
        };
        assert_eq!(config.effective_log_level(), expected);
    }

    #[test]
    fn test_bot_settings_in_dev() {
        let config = AppConfig {
            environment: Environment::Dev,
            ..AppConfig::default()
        };

        let settings = config.bot_settings();
        assert!(settings.dev_mode);
        assert!(settings.accepts_channel(ChannelId(DEFAULT_DEV_CHANNEL_ID)));
        assert!(!settings.accepts_channel(ChannelId(1)));
    }

    #[test]
    fn test_merge_with_args() {
        let args = CliArgs::parse_from([
            "embedfix",
            "--discord-token",
            "MTIzNDU2Nzg5MDEyMzQ1Njc4OQ.XXXXXX.YYYYYYYYYYYYYYYYYYYYYYYYYYYY",
            "--reaction-emoji",
            "🔥",
            "--suppress-embeds",
            "false",
            "--environment",
            "dev",
            "--reddit-password",
            "hunter2",
            "--reddit-client-id",
            "id",
            "--reddit-secret",
            "secret",
        ]);

        let mut config = AppConfig::default();
        config.merge_with_args(args);

        assert!(config.discord_token.is_some());
        assert_eq!(config.reaction_emoji, "🔥");
        assert!(!config.suppress_embeds);
        assert!(config.environment.is_dev());
        assert!(config.reddit_credentials().is_some());
    }

    #[test]
    fn test_bot_token_validation() {
        let mut config = AppConfig::default();
        assert!(matches!(config.bot_token(), Err(ConfigError::MissingToken)));

        config.discord_token = Some(Secret::new("short"));
        assert!(matches!(config.bot_token(), Err(ConfigError::InvalidToken)));

        config.discord_token = Some(Secret::new(
            "Bot MTIzNDU2Nzg5MDEyMzQ1Njc4OQ.XXXXXX.YYYYYYYYYYYYYYYYYYYYYYYYYYYY",
        ));
        assert!(config.bot_token().is_ok());
    }

    #[test]
    fn test_empty_token_is_ignored() {
        let args = CliArgs::parse_from(["embedfix", "--discord-token", " "]);

        let mut config = AppConfig::default();
        config.merge_with_args(args);

        assert!(config.discord_token.is_none());
    }
}
