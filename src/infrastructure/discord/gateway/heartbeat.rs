use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, interval_at};
use tracing::{debug, trace};

use super::constants::HEARTBEAT_JITTER_PERCENT;
use super::payloads::GatewayPayload;

/// Periodically queues heartbeats carrying the last seen sequence number.
///
/// A sequence of 0 means none has been received yet.
pub struct HeartbeatManager {
    interval_ms: u64,
    sequence: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
}

impl HeartbeatManager {
    #[must_use]
    pub fn new(interval_ms: u64, sequence: Arc<AtomicU64>) -> Self {
        Self {
            interval_ms,
            sequence,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn start(&self, payload_tx: mpsc::Sender<GatewayPayload>) -> tokio::task::JoinHandle<()> {
        let interval_ms = self.interval_ms;
        let sequence = self.sequence.clone();
        let running = self.running.clone();

        running.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            let jitter = (interval_ms as f64 * HEARTBEAT_JITTER_PERCENT) as u64;
            let first_delay = Duration::from_millis(interval_ms - jitter);
            let mut ticker = interval_at(
                Instant::now() + first_delay,
                Duration::from_millis(interval_ms),
            );

            while running.load(Ordering::SeqCst) {
                ticker.tick().await;

                if !running.load(Ordering::SeqCst) {
                    break;
                }

                let payload = GatewayPayload::heartbeat(current_sequence(&sequence));
                if payload_tx.send(payload).await.is_err() {
                    debug!("Heartbeat channel closed");
                    break;
                }
                trace!("Queued heartbeat");
            }

            debug!("Heartbeat loop stopped");
        })
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Drop for HeartbeatManager {
    fn drop(&mut self) {
        self.stop();
    }
}

pub fn current_sequence(sequence: &AtomicU64) -> Option<u64> {
    match sequence.load(Ordering::SeqCst) {
        0 => None,
        seq => Some(seq),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heartbeat_manager_creation() {
        let manager = HeartbeatManager::new(45000, Arc::new(AtomicU64::new(0)));
        assert_eq!(manager.interval_ms, 45000);
        assert!(!manager.running.load(Ordering::SeqCst));
    }

    #[test]
    fn test_current_sequence() {
        let sequence = AtomicU64::new(0);
        assert_eq!(current_sequence(&sequence), None);
        sequence.store(7, Ordering::SeqCst);
        assert_eq!(current_sequence(&sequence), Some(7));
    }

    #[tokio::test]
    async fn test_heartbeat_carries_latest_sequence() {
        let sequence = Arc::new(AtomicU64::new(0));
        let manager = HeartbeatManager::new(20, sequence.clone());
        let (tx, mut rx) = mpsc::channel(4);

        let _handle = manager.start(tx);
        sequence.store(42, Ordering::SeqCst);

        let payload = rx.recv().await.unwrap();
        assert!(payload.is_heartbeat());
        assert_eq!(payload.d, serde_json::json!(42));

        manager.stop();
    }
}
