use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::heartbeat::current_sequence;

/// Resume data carried from one gateway connection to the next.
///
/// The last sequence number lives behind a shared counter so the heartbeat
/// task always reports the latest value. Clones share that counter.
#[derive(Debug, Clone, Default)]
pub struct SessionInfo {
    session_id: Option<String>,
    resume_gateway_url: Option<String>,
    user_id: Option<String>,
    sequence: Arc<AtomicU64>,
}

impl SessionInfo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the identifiers handed out in `READY`.
    pub fn begin(&mut self, session_id: String, resume_url: Option<String>, user_id: String) {
        self.session_id = Some(session_id);
        self.resume_gateway_url = resume_url;
        self.user_id = Some(user_id);
    }

    /// Records the sequence number of a dispatch. `None` leaves it unchanged.
    pub fn record_sequence(&self, sequence: Option<u64>) {
        if let Some(seq) = sequence {
            self.sequence.store(seq, Ordering::SeqCst);
        }
    }

    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    #[must_use]
    pub fn resume_gateway_url(&self) -> Option<&str> {
        self.resume_gateway_url.as_deref()
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    #[must_use]
    pub fn sequence(&self) -> Option<u64> {
        current_sequence(&self.sequence)
    }

    /// Counter shared with the heartbeat task.
    #[must_use]
    pub fn sequence_counter(&self) -> Arc<AtomicU64> {
        self.sequence.clone()
    }

    #[must_use]
    pub fn can_resume(&self) -> bool {
        self.session_id.is_some() && self.sequence().is_some()
    }

    /// Drops resume data after the gateway refused it. The next connection
    /// identifies from scratch.
    pub fn invalidate(&mut self) {
        self.session_id = None;
        self.resume_gateway_url = None;
        self.sequence.store(0, Ordering::SeqCst);
    }

    /// Forgets everything, including the bot's user id.
    pub fn reset(&mut self) {
        self.invalidate();
        self.user_id = None;
    }
}
