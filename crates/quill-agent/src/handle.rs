//! A cloneable handle for poking the orchestrator from external code.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::transcript::TranscriptStore;

/// A cloneable handle for poking the orchestrator from external code.
///
/// All fields are `Arc`-wrapped, so cloning is cheap.
#[derive(Clone)]
pub struct OrchestratorHandle {
    pub(crate) cancel: Arc<Mutex<CancellationToken>>,
    pub(crate) idle_notify: Arc<tokio::sync::Notify>,
    pub(crate) transcript: Arc<TranscriptStore>,
}

impl OrchestratorHandle {
    pub(crate) fn new(transcript: Arc<TranscriptStore>) -> Self {
        Self {
            cancel: Arc::new(Mutex::new(CancellationToken::new())),
            idle_notify: Arc::new(tokio::sync::Notify::new()),
            transcript,
        }
    }

    /// Abort the in-flight request, if any.
    pub fn abort(&self) {
        self.cancel.lock().cancel();
    }

    /// Admit a request and install its cancellation token.
    ///
    /// Returns `None` if a request is already in flight. The busy flag is
    /// raised while the token lock is held, so an `abort()` that observes
    /// `is_busy()` always reaches the new token.
    pub(crate) fn begin(&self) -> Option<CancellationToken> {
        let mut cancel = self.cancel.lock();
        if !self.transcript.try_begin() {
            return None;
        }
        *cancel = CancellationToken::new();
        Some(cancel.clone())
    }

    /// Whether a request is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.transcript.is_busy()
    }

    /// Wait until no request is in flight.
    pub async fn wait_for_idle(&self) {
        let notified = self.idle_notify.notified();
        if !self.transcript.is_busy() {
            return;
        }
        notified.await;
    }

    /// Wait until idle, with a timeout.
    /// Returns `true` if idle was reached, `false` on timeout.
    pub async fn wait_for_idle_timeout(&self, timeout: std::time::Duration) -> bool {
        if !self.transcript.is_busy() {
            return true;
        }
        tokio::time::timeout(timeout, self.wait_for_idle())
            .await
            .is_ok()
    }
}

impl std::fmt::Debug for OrchestratorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestratorHandle")
            .field("busy", &self.is_busy())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_begin_installs_fresh_token() {
        let handle = OrchestratorHandle::new(Arc::new(TranscriptStore::new()));
        handle.abort();

        let token = handle.begin().unwrap();
        assert!(!token.is_cancelled());
        assert!(handle.is_busy());

        handle.abort();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_rejected_begin_keeps_in_flight_token() {
        let handle = OrchestratorHandle::new(Arc::new(TranscriptStore::new()));
        let token = handle.begin().unwrap();

        assert!(handle.begin().is_none());
        handle.abort();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_abort_seen_busy_reaches_request() {
        for _ in 0..200 {
            let handle = OrchestratorHandle::new(Arc::new(TranscriptStore::new()));
            let aborter = {
                let handle = handle.clone();
                std::thread::spawn(move || {
                    while !handle.is_busy() {
                        std::hint::spin_loop();
                    }
                    handle.abort();
                })
            };
            let token = handle.begin().unwrap();
            aborter.join().unwrap();
            assert!(token.is_cancelled());
        }
    }

    #[tokio::test]
    async fn test_wait_for_idle_when_not_busy() {
        let handle = OrchestratorHandle::new(Arc::new(TranscriptStore::new()));
        assert!(handle.wait_for_idle_timeout(Duration::from_millis(10)).await);
    }
}
