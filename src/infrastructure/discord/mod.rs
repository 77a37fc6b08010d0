//! Discord REST and gateway adapters.

mod client;
mod dto;
pub mod gateway;

pub use client::{DISCORD_API_BASE, DiscordRestClient};
pub use gateway::{DispatchEvent, GatewayClient, GatewayClientConfig, GatewayEventKind};
