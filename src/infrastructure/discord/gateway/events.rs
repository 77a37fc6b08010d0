use crate::domain::entities::InboundMessage;

/// What the gateway loop reports to the bot.
#[derive(Debug, Clone)]
pub enum GatewayEventKind {
    Dispatch(DispatchEvent),
    /// A connection attempt or session failed. `recoverable: false` means the
    /// loop has stopped.
    Error {
        message: String,
        recoverable: bool,
    },
}

#[derive(Debug, Clone)]
pub enum DispatchEvent {
    Ready {
        session_id: String,
        resume_gateway_url: Option<String>,
        user_id: String,
        username: String,
    },
    MessageCreate {
        message: InboundMessage,
    },
    /// Any event the bot does not act on.
    Unknown {
        event_type: String,
    },
}
