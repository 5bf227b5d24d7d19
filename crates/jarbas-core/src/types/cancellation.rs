//! Cancellation propagated from the conversation boundary down to each
//! transport call

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

/// Shared cancel flag
///
/// Clones observe the same flag. Once set it stays set.
#[derive(Clone)]
pub struct CancellationToken {
    flag: Arc<watch::Sender<bool>>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    pub fn new() -> Self {
        let (flag, _) = watch::channel(false);
        Self { flag: Arc::new(flag) }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.flag.borrow()
    }

    /// Set the flag and wake every waiter
    pub fn cancel(&self) {
        self.flag.send_if_modified(|cancelled| !std::mem::replace(cancelled, true));
    }

    /// Resolve once the flag is set
    pub async fn cancelled(&self) {
        let mut rx = self.flag.subscribe();
        // The sender lives as long as `self`, so this only ends on cancel
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Run `fut` unless the flag is set first
    ///
    /// `None` means cancelled; `fut` is dropped where it was suspended.
    pub async fn run_until_cancelled<F: Future>(&self, fut: F) -> Option<F::Output> {
        if self.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => None,
            out = fut => Some(out),
        }
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CancellationToken({})", if self.is_cancelled() { "cancelled" } else { "live" })
    }
}
