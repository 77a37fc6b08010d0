//! Infrastructure layer with external service adapters.

/// Result cache.
pub mod cache;
/// Application configuration.
pub mod config;
/// Discord REST and gateway adapters.
pub mod discord;
/// Reddit upstream adapter.
pub mod reddit;

pub use cache::{CacheStats, LruResultCache};
pub use config::{AppConfig, CliArgs, ConfigError, ConfigLoader, LogLevel};
pub use discord::{
    DiscordRestClient, DispatchEvent, GatewayClient, GatewayClientConfig, GatewayEventKind,
};
pub use reddit::{RedditHttpClient, UpstreamClientConfig};
