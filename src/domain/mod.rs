//! Domain layer with core entities and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;

pub use entities::{BotSettings, InboundMessage, RewriteResult};
pub use errors::{ClassificationError, DeliveryError};
pub use ports::{MessagingPort, ResultCachePort, UpstreamHttpPort};
