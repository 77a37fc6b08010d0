use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace, warn};

use super::constants::{
    CONNECTION_TIMEOUT, GATEWAY_URL, GatewayIntents, GatewayOpcode, HELLO_TIMEOUT,
    IDENTIFY_TIMEOUT,
};
use super::error::{GatewayError, GatewayResult};
use super::events::{DispatchEvent, GatewayEventKind};
use super::parser::EventParser;
use super::payloads::{GatewayMessage, GatewayPayload};
use super::session::SessionInfo;
use super::state::GatewayState;
use crate::domain::entities::BotToken;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, WsMessage>;
type WsReader = SplitStream<WsStream>;

#[async_trait]
pub trait GatewayConnection: Send + Sync {
    async fn connect(&mut self, gateway_url: &str) -> GatewayResult<()>;
    async fn disconnect(&mut self) -> GatewayResult<()>;
    async fn send(&mut self, payload: &GatewayPayload) -> GatewayResult<()>;
    async fn receive(&mut self) -> GatewayResult<Option<GatewayMessage>>;
    fn is_connected(&self) -> bool;
}

pub struct WebSocketConnection {
    writer: Option<WsWriter>,
    reader: Option<WsReader>,
    connected: bool,
}

impl WebSocketConnection {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            writer: None,
            reader: None,
            connected: false,
        }
    }
}

impl Default for WebSocketConnection {
    fn default() -> Self {
        Self::new()
    }
}

/// Adds the version and encoding query to a resume URL, which Discord sends bare.
fn with_gateway_query(url: &str) -> String {
    if url.contains('?') {
        url.to_string()
    } else {
        format!("{}/?v=10&encoding=json", url.trim_end_matches('/'))
    }
}

/// Op 7 ends the connection the same way a resumable close does.
fn reconnect_requested() -> GatewayError {
    GatewayError::ConnectionClosed {
        code: 4000,
        reason: "Reconnect requested".to_string(),
    }
}

#[async_trait]
impl GatewayConnection for WebSocketConnection {
    async fn connect(&mut self, gateway_url: &str) -> GatewayResult<()> {
        let (ws_stream, _) = timeout(CONNECTION_TIMEOUT, connect_async(gateway_url))
            .await
            .map_err(|_| GatewayError::timeout("connection"))?
            .map_err(|e| GatewayError::connection_failed(e.to_string()))?;

        let (writer, reader) = ws_stream.split();
        self.writer = Some(writer);
        self.reader = Some(reader);
        self.connected = true;

        Ok(())
    }

    async fn disconnect(&mut self) -> GatewayResult<()> {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.close().await;
        }
        self.reader = None;
        self.connected = false;
        debug!("WebSocket connection closed");
        Ok(())
    }

    async fn send(&mut self, payload: &GatewayPayload) -> GatewayResult<()> {
        let writer = self.writer.as_mut().ok_or(GatewayError::NotConnected)?;

        let json = serde_json::to_string(payload)
            .map_err(|e| GatewayError::serialization(e.to_string()))?;

        writer
            .send(WsMessage::Text(json.into()))
            .await
            .map_err(|e| GatewayError::websocket(e.to_string()))?;

        Ok(())
    }

    async fn receive(&mut self) -> GatewayResult<Option<GatewayMessage>> {
        let reader = self.reader.as_mut().ok_or(GatewayError::NotConnected)?;

        loop {
            match reader.next().await {
                Some(Ok(WsMessage::Text(text))) => {
                    let message = EventParser::parse_message(&text)?;
                    return Ok(Some(message));
                }
                Some(Ok(WsMessage::Binary(data))) => {
                    let text = std::str::from_utf8(&data)
                        .map_err(|e| GatewayError::serialization(e.to_string()))?;
                    let message = EventParser::parse_message(text)?;
                    return Ok(Some(message));
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    self.connected = false;
                    let (code, reason) = frame.map_or_else(
                        || (1000, "Normal closure".to_string()),
                        |f| (f.code.into(), f.reason.to_string()),
                    );

                    return Err(GatewayError::ConnectionClosed { code, reason });
                }
                Some(Ok(WsMessage::Ping(data))) => {
                    if let Some(writer) = self.writer.as_mut() {
                        let _ = writer.send(WsMessage::Pong(data)).await;
                    }
                }
                Some(Ok(WsMessage::Pong(_) | WsMessage::Frame(_))) => {}
                Some(Err(e)) => {
                    self.connected = false;
                    return Err(GatewayError::websocket(e.to_string()));
                }
                None => {
                    self.connected = false;
                    return Err(GatewayError::ConnectionClosed {
                        code: 1006,
                        reason: "Stream ended".to_string(),
                    });
                }
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Drives one gateway connection from handshake to close.
pub struct GatewayConnectionHandler {
    connection: Box<dyn GatewayConnection>,
    state: GatewayState,
    session: SessionInfo,
    token: BotToken,
    intents: GatewayIntents,
    event_tx: mpsc::UnboundedSender<GatewayEventKind>,
    payload_rx: mpsc::Receiver<GatewayPayload>,
    heartbeat_requested: bool,
}

impl GatewayConnectionHandler {
    pub fn new(
        connection: Box<dyn GatewayConnection>,
        token: BotToken,
        intents: GatewayIntents,
        session: SessionInfo,
        event_tx: mpsc::UnboundedSender<GatewayEventKind>,
        payload_rx: mpsc::Receiver<GatewayPayload>,
    ) -> Self {
        Self {
            connection,
            state: GatewayState::new(),
            session,
            token,
            intents,
            event_tx,
            payload_rx,
            heartbeat_requested: false,
        }
    }

    /// Opens the socket and identifies, or resumes when the session allows it.
    ///
    /// # Errors
    /// Returns error if the socket cannot be opened or the handshake fails.
    pub async fn connect(&mut self) -> GatewayResult<()> {
        self.state.transition_to_connecting();

        let url = self
            .session
            .resume_gateway_url()
            .filter(|_| self.session.can_resume())
            .map_or_else(|| GATEWAY_URL.to_string(), with_gateway_query);
        self.connection.connect(&url).await?;

        self.state.transition_to_waiting_hello();
        self.await_hello().await?;

        if self.session.can_resume() {
            self.resume().await?;
        } else {
            self.identify().await?;
        }

        Ok(())
    }

    async fn await_hello(&mut self) -> GatewayResult<()> {
        let message = timeout(HELLO_TIMEOUT, self.connection.receive())
            .await
            .map_err(|_| GatewayError::timeout("Hello"))?
            .map_err(|e| GatewayError::connection_failed(format!("Failed to receive Hello: {e}")))?
            .ok_or_else(|| GatewayError::protocol("Expected Hello message"))?;

        let opcode = GatewayOpcode::from_u8(message.op);
        if opcode != Some(GatewayOpcode::Hello) {
            return Err(GatewayError::UnexpectedOpcode { opcode });
        }

        let data = message
            .d
            .ok_or_else(|| GatewayError::protocol("Hello missing data"))?;

        let hello = EventParser::parse_hello(&data)?;
        self.state.set_heartbeat_interval(hello.heartbeat_interval);

        debug!(
            interval_ms = hello.heartbeat_interval,
            "Received Hello from gateway"
        );

        Ok(())
    }

    async fn identify(&mut self) -> GatewayResult<()> {
        self.state.transition_to_identifying();

        let payload = GatewayPayload::identify(self.token.as_str(), self.intents.as_u32());
        self.connection.send(&payload).await?;

        self.await_ready().await
    }

    async fn resume(&mut self) -> GatewayResult<()> {
        self.state.transition_to_resuming();

        let session_id = self
            .session
            .session_id()
            .ok_or_else(|| GatewayError::protocol("No session to resume"))?
            .to_string();

        let sequence = self
            .session
            .sequence()
            .ok_or_else(|| GatewayError::protocol("No sequence to resume"))?;

        let payload = GatewayPayload::resume(self.token.as_str(), &session_id, sequence);
        self.connection.send(&payload).await?;

        debug!(session_id = %session_id, sequence = sequence, "Sent Resume payload");

        self.await_resumed().await
    }

    async fn await_ready(&mut self) -> GatewayResult<()> {
        loop {
            let message = self.receive_handshake("Ready").await?;

            match GatewayOpcode::from_u8(message.op) {
                Some(GatewayOpcode::Dispatch) if message.t.as_deref() == Some("READY") => {
                    self.handle_ready_event(message)?;
                    self.state.transition_to_connected();
                    return Ok(());
                }
                Some(GatewayOpcode::InvalidSession) => {
                    let resumable = message.d.and_then(|d| d.as_bool()).unwrap_or(false);
                    return Err(GatewayError::SessionInvalidated { resumable });
                }
                _ => self.handle_handshake_control(&message).await?,
            }
        }
    }

    async fn await_resumed(&mut self) -> GatewayResult<()> {
        // Missed events are replayed before RESUMED.
        loop {
            let message = self.receive_handshake("Resumed").await?;

            match GatewayOpcode::from_u8(message.op) {
                Some(GatewayOpcode::Dispatch) if message.t.as_deref() == Some("RESUMED") => {
                    self.session.record_sequence(message.s);
                    info!("Session resumed successfully");
                    self.state.transition_to_connected();
                    return Ok(());
                }
                Some(GatewayOpcode::Dispatch) => self.handle_message(message)?,
                Some(GatewayOpcode::InvalidSession) => {
                    let resumable = message.d.and_then(|d| d.as_bool()).unwrap_or(false);

                    if !resumable {
                        self.session.invalidate();
                    }
                    return Err(GatewayError::SessionInvalidated { resumable });
                }
                _ => self.handle_handshake_control(&message).await?,
            }
        }
    }

    /// Control opcodes the gateway may send before the handshake completes.
    async fn handle_handshake_control(&mut self, message: &GatewayMessage) -> GatewayResult<()> {
        match GatewayOpcode::from_u8(message.op) {
            Some(GatewayOpcode::HeartbeatAck) => Ok(()),
            Some(GatewayOpcode::Heartbeat) => {
                debug!("Gateway requested heartbeat during handshake");
                let payload = GatewayPayload::heartbeat(self.current_sequence());
                self.connection.send(&payload).await
            }
            Some(GatewayOpcode::Reconnect) => {
                info!("Gateway requested reconnect during handshake");
                Err(reconnect_requested())
            }
            opcode => Err(GatewayError::UnexpectedOpcode { opcode }),
        }
    }

    async fn receive_handshake(&mut self, operation: &str) -> GatewayResult<GatewayMessage> {
        timeout(IDENTIFY_TIMEOUT, self.connection.receive())
            .await
            .map_err(|_| GatewayError::timeout(operation))??
            .ok_or_else(|| GatewayError::protocol(format!("Expected {operation} message")))
    }

    fn handle_ready_event(&mut self, message: GatewayMessage) -> GatewayResult<()> {
        self.session.record_sequence(message.s);

        let dispatch = EventParser::parse_dispatch("READY", message.d)?;

        if let DispatchEvent::Ready {
            session_id,
            resume_gateway_url,
            user_id,
            username,
        } = &dispatch
        {
            self.session.begin(
                session_id.clone(),
                resume_gateway_url.clone(),
                user_id.clone(),
            );

            info!(session_id = %session_id, username = %username, "Gateway ready");

            let _ = self.event_tx.send(GatewayEventKind::Dispatch(dispatch));
        }

        Ok(())
    }

    /// Processes gateway traffic until the connection closes.
    ///
    /// # Errors
    /// Returns error when the connection closes, the session is invalidated
    /// or a heartbeat goes unacknowledged.
    pub async fn run(&mut self) -> GatewayResult<()> {
        while self.state.connection().is_connected() {
            tokio::select! {
                result = self.connection.receive() => {
                    if let Some(message) = result? {
                        self.handle_message(message)?;
                    }
                    if self.heartbeat_requested {
                        self.heartbeat_requested = false;
                        // Requested beats do not count against the ack check.
                        let payload = GatewayPayload::heartbeat(self.current_sequence());
                        self.connection.send(&payload).await?;
                    }
                }

                Some(payload) = self.payload_rx.recv() => {
                    self.send_payload(&payload).await?;
                }
            }
        }

        Ok(())
    }

    async fn send_payload(&mut self, payload: &GatewayPayload) -> GatewayResult<()> {
        if payload.is_heartbeat() && !self.state.record_heartbeat_sent() {
            warn!("Heartbeat ACK not received, connection may be dead");
            return Err(GatewayError::HeartbeatTimeout);
        }

        if let Err(e) = self.connection.send(payload).await {
            warn!(error = %e, "Failed to send payload");
            return Err(e);
        }

        Ok(())
    }

    fn handle_message(&mut self, message: GatewayMessage) -> GatewayResult<()> {
        self.session.record_sequence(message.s);

        let opcode = GatewayOpcode::from_u8(message.op);
        match opcode {
            Some(GatewayOpcode::Dispatch) => {
                if let Some(event_type) = message.t.as_deref() {
                    trace!(event = event_type, "Raw dispatch received");
                    self.handle_dispatch(event_type, message.d);
                }
            }
            Some(GatewayOpcode::HeartbeatAck) => {
                trace!("Heartbeat acknowledged");
                self.state.record_heartbeat_ack();
            }
            Some(GatewayOpcode::Heartbeat) => {
                debug!("Gateway requested immediate heartbeat");
                self.heartbeat_requested = true;
            }
            Some(GatewayOpcode::Reconnect) => {
                info!("Gateway requested reconnect");
                return Err(reconnect_requested());
            }
            Some(GatewayOpcode::InvalidSession) => {
                let resumable = message.d.and_then(|d| d.as_bool()).unwrap_or(false);

                warn!(resumable = resumable, "Session invalidated");

                if !resumable {
                    self.session.invalidate();
                }

                return Err(GatewayError::SessionInvalidated { resumable });
            }
            _ => {
                debug!(opcode = ?opcode, "Unhandled opcode");
            }
        }

        Ok(())
    }

    fn handle_dispatch(&self, event_type: &str, data: Option<serde_json::Value>) {
        match EventParser::parse_dispatch(event_type, data) {
            Ok(DispatchEvent::Unknown { event_type }) => {
                trace!(event = %event_type, "Ignoring event");
            }
            Ok(event) => {
                debug!(event = event_type, "Dispatching event");
                let _ = self.event_tx.send(GatewayEventKind::Dispatch(event));
            }
            Err(e) => {
                warn!(event = event_type, error = %e, "Failed to parse dispatch event");
            }
        }
    }

    /// Closes the socket.
    pub async fn disconnect(&mut self) {
        let _ = self.connection.disconnect().await;
        self.state.transition_to_disconnected();
    }

    #[must_use]
    pub const fn session(&self) -> &SessionInfo {
        &self.session
    }

    #[must_use]
    pub fn sequence(&self) -> Arc<AtomicU64> {
        self.session.sequence_counter()
    }

    #[cfg(test)]
    const fn state(&self) -> &GatewayState {
        &self.state
    }

    #[must_use]
    pub const fn heartbeat_interval(&self) -> Option<u64> {
        self.state.heartbeat_interval_ms()
    }

    #[must_use]
    pub fn current_sequence(&self) -> Option<u64> {
        self.session.sequence()
    }
}
