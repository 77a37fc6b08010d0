use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::connection::{GatewayConnectionHandler, WebSocketConnection};
use super::constants::{
    GatewayIntents, MAX_RECONNECT_ATTEMPTS, RECONNECT_DELAY_BASE, RECONNECT_DELAY_MAX,
    RECONNECT_JITTER_MAX,
};
use super::error::{GatewayError, GatewayResult};
use super::events::GatewayEventKind;
use super::heartbeat::HeartbeatManager;
use super::payloads::GatewayPayload;
use super::session::SessionInfo;
use crate::domain::entities::BotToken;

pub struct GatewayClientConfig {
    pub intents: GatewayIntents,
    /// Consecutive failed attempts before the loop gives up.
    pub max_reconnect_attempts: u32,
}

impl Default for GatewayClientConfig {
    fn default() -> Self {
        Self {
            intents: GatewayIntents::bot(),
            max_reconnect_attempts: MAX_RECONNECT_ATTEMPTS,
        }
    }
}

/// Keeps a bot session on the gateway alive, reconnecting with backoff.
pub struct GatewayClient {
    config: GatewayClientConfig,
    cancel: Option<CancellationToken>,
}

impl GatewayClient {
    #[must_use]
    pub const fn new(config: GatewayClientConfig) -> Self {
        Self {
            config,
            cancel: None,
        }
    }

    /// Spawns the gateway loop. It stops when `cancel` fires, on a fatal
    /// close code, or after too many failed reconnects.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::AlreadyConnected` if connection is already active.
    pub fn connect(
        &mut self,
        token: BotToken,
        cancel: CancellationToken,
    ) -> GatewayResult<mpsc::UnboundedReceiver<GatewayEventKind>> {
        if self.is_running() {
            return Err(GatewayError::AlreadyConnected);
        }

        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let config = GatewayLoopConfig {
            token,
            intents: self.config.intents,
            max_attempts: self.config.max_reconnect_attempts,
        };
        self.cancel = Some(cancel.clone());

        tokio::spawn(async move {
            let result = std::panic::AssertUnwindSafe(run_gateway_loop(
                config,
                event_tx.clone(),
                cancel.clone(),
            ));

            if let Err(panic_info) = result.catch_unwind().await {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };

                error!(panic = %panic_msg, "Gateway task panicked");
                let _ = event_tx.send(GatewayEventKind::Error {
                    message: format!("Gateway task panicked: {panic_msg}"),
                    recoverable: false,
                });
            }
            cancel.cancel();
        });

        Ok(event_rx)
    }

    pub fn disconnect(&self) {
        if let Some(cancel) = &self.cancel {
            cancel.cancel();
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|cancel| !cancel.is_cancelled())
    }
}

struct GatewayLoopConfig {
    token: BotToken,
    intents: GatewayIntents,
    max_attempts: u32,
}

async fn run_gateway_loop(
    config: GatewayLoopConfig,
    event_tx: mpsc::UnboundedSender<GatewayEventKind>,
    cancel: CancellationToken,
) {
    let mut reconnect_attempts: u32 = 0;
    let mut session = SessionInfo::new();

    while !cancel.is_cancelled() {
        let (payload_tx, payload_rx) = mpsc::channel(32);

        let handler = GatewayConnectionHandler::new(
            Box::new(WebSocketConnection::new()),
            config.token.clone(),
            config.intents,
            session.clone(),
            event_tx.clone(),
            payload_rx,
        );

        let result = run_single_connection(handler, payload_tx, &cancel, &mut session).await;

        match result {
            ConnectionResult::Closed => break,
            ConnectionResult::Error(e) => {
                error!(error = %e, "Failed to connect to gateway");

                let _ = event_tx.send(GatewayEventKind::Error {
                    message: e.to_string(),
                    recoverable: e.should_reconnect(),
                });

                if !e.should_reconnect() {
                    break;
                }
                if !e.can_resume() {
                    session.invalidate();
                }

                reconnect_attempts += 1;
            }
            ConnectionResult::Disconnected(e) => {
                reconnect_attempts = 0;
                if !handle_connection_error(&e, &mut session) {
                    let _ = event_tx.send(GatewayEventKind::Error {
                        message: e.to_string(),
                        recoverable: false,
                    });
                    break;
                }
                reconnect_attempts += 1;
            }
        }

        if cancel.is_cancelled() {
            break;
        }

        if reconnect_attempts >= config.max_attempts {
            error!(
                attempts = reconnect_attempts,
                "Max reconnection attempts exceeded"
            );
            let _ = event_tx.send(GatewayEventKind::Error {
                message: format!(
                    "Max reconnection attempts ({}) exceeded",
                    config.max_attempts
                ),
                recoverable: false,
            });
            break;
        }

        let delay = calculate_backoff_delay(reconnect_attempts);
        info!(
            attempt = reconnect_attempts,
            delay_ms = delay.as_millis(),
            resume = session.can_resume(),
            "Reconnecting to gateway"
        );

        tokio::select! {
            () = cancel.cancelled() => break,
            () = sleep(delay) => {}
        }
    }

    info!("Gateway loop terminated");
}

enum ConnectionResult {
    /// Shut down on request.
    Closed,
    /// The handshake failed.
    Error(GatewayError),
    /// An established connection dropped.
    Disconnected(GatewayError),
}

async fn run_single_connection(
    mut handler: GatewayConnectionHandler,
    payload_tx: mpsc::Sender<GatewayPayload>,
    cancel: &CancellationToken,
    session: &mut SessionInfo,
) -> ConnectionResult {
    let connected = tokio::select! {
        biased;
        () = cancel.cancelled() => return ConnectionResult::Closed,
        result = handler.connect() => result,
    };

    if let Err(e) = connected {
        *session = handler.session().clone();
        return ConnectionResult::Error(e);
    }
    info!("Gateway connected");

    let Some(interval) = handler.heartbeat_interval() else {
        return ConnectionResult::Error(GatewayError::protocol("missing heartbeat interval"));
    };

    let heartbeat = HeartbeatManager::new(interval, handler.sequence());
    let heartbeat_handle = heartbeat.start(payload_tx);

    let run_result = tokio::select! {
        biased;
        () = cancel.cancelled() => None,
        result = handler.run() => Some(result),
    };

    heartbeat.stop();
    heartbeat_handle.abort();
    *session = handler.session().clone();

    match run_result {
        None => {
            handler.disconnect().await;
            ConnectionResult::Closed
        }
        Some(Err(e)) => ConnectionResult::Disconnected(e),
        Some(Ok(())) => ConnectionResult::Disconnected(GatewayError::ConnectionClosed {
            code: 1000,
            reason: "Connection closed".to_string(),
        }),
    }
}

/// Logs a dropped connection and prepares the session for the next attempt.
///
/// Returns whether the loop should reconnect.
fn handle_connection_error(error: &GatewayError, session: &mut SessionInfo) -> bool {
    warn!(error = %error, "Connection error");

    if !error.can_resume() {
        session.invalidate();
    }

    if error.is_fatal() {
        error!(code = ?error.close_code(), "Gateway closed with a fatal code");
        session.reset();
    }

    error.should_reconnect()
}

#[allow(clippy::cast_possible_truncation)]
fn calculate_backoff_delay(attempt: u32) -> Duration {
    let base_delay = RECONNECT_DELAY_BASE.as_millis() as u64;
    let max_delay = RECONNECT_DELAY_MAX.as_millis() as u64;
    let jitter_max = RECONNECT_JITTER_MAX.as_millis() as u64;

    let exponential_delay = base_delay.saturating_mul(2_u64.saturating_pow(attempt.min(6)));
    let capped_delay = exponential_delay.min(max_delay);

    let jitter = rand_jitter(jitter_max);
    let total_delay = capped_delay.saturating_add(jitter);

    Duration::from_millis(total_delay)
}

fn rand_jitter(max: u64) -> u64 {
    use std::time::SystemTime;

    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| u64::from(d.subsec_nanos()))
        .unwrap_or(0);

    nanos % max
}
