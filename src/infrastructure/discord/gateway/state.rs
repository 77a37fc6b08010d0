#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    WaitingForHello,
    Identifying,
    Resuming,
    Connected,
}

impl ConnectionState {
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

pub struct GatewayState {
    connection: ConnectionState,
    awaiting_ack: bool,
    heartbeat_interval_ms: Option<u64>,
}

impl GatewayState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            awaiting_ack: false,
            heartbeat_interval_ms: None,
        }
    }

    #[must_use]
    pub const fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub const fn transition_to_connecting(&mut self) {
        self.connection = ConnectionState::Connecting;
    }

    pub const fn transition_to_waiting_hello(&mut self) {
        self.connection = ConnectionState::WaitingForHello;
    }

    pub const fn transition_to_identifying(&mut self) {
        self.connection = ConnectionState::Identifying;
    }

    pub const fn transition_to_resuming(&mut self) {
        self.connection = ConnectionState::Resuming;
    }

    pub const fn transition_to_connected(&mut self) {
        self.connection = ConnectionState::Connected;
    }

    pub const fn transition_to_disconnected(&mut self) {
        self.connection = ConnectionState::Disconnected;
        self.awaiting_ack = false;
    }

    pub const fn set_heartbeat_interval(&mut self, interval_ms: u64) {
        self.heartbeat_interval_ms = Some(interval_ms);
    }

    #[must_use]
    pub const fn heartbeat_interval_ms(&self) -> Option<u64> {
        self.heartbeat_interval_ms
    }

    /// Records an outgoing heartbeat.
    ///
    /// Returns `false` if the previous heartbeat was never acknowledged.
    pub const fn record_heartbeat_sent(&mut self) -> bool {
        let acknowledged = !self.awaiting_ack;
        self.awaiting_ack = true;
        acknowledged
    }

    pub const fn record_heartbeat_ack(&mut self) {
        self.awaiting_ack = false;
    }
}

impl Default for GatewayState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_state_transitions() {
        let mut state = GatewayState::new();
        assert_eq!(state.connection(), ConnectionState::Disconnected);

        state.transition_to_connecting();
        assert_eq!(state.connection(), ConnectionState::Connecting);

        state.transition_to_connected();
        assert!(state.connection().is_connected());

        state.transition_to_disconnected();
        assert!(!state.connection().is_connected());
    }

    #[test]
    fn test_missed_heartbeat_ack_detected() {
        let mut state = GatewayState::new();

        assert!(state.record_heartbeat_sent());
        state.record_heartbeat_ack();

        assert!(state.record_heartbeat_sent());
        assert!(!state.record_heartbeat_sent());
    }

    #[test]
    fn test_disconnect_clears_pending_ack() {
        let mut state = GatewayState::new();
        state.record_heartbeat_sent();

        state.transition_to_disconnected();

        assert!(state.record_heartbeat_sent());
    }
}
