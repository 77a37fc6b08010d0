mod client;
mod connection;
mod constants;
mod error;
mod events;
mod heartbeat;
mod parser;
mod payloads;
mod session;
mod state;

pub use client::{GatewayClient, GatewayClientConfig};
pub use constants::GatewayIntents;
pub use error::{GatewayError, GatewayResult};
pub use events::{DispatchEvent, GatewayEventKind};
