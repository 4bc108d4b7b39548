//! # Pause gate: a shared latch jobs can wait on.
//!
//! [`PauseGate`] is owned by the controller and flipped by `pause`/`resume`.
//! Jobs receive a [`PauseToken`] and await it at their own checkpoints; the gate
//! never suspends a job on its own.
//!
//! ## Rules
//! - `set_paused` is idempotent, non-blocking, callable from any thread
//! - `wait_while_paused` returns immediately when the gate is open
//! - all waiters are released when the gate opens (no ordering between them)
//! - a waiter also returns when its cancellation token fires, with [`JobError::Canceled`]

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::JobError;

/// Controller side of the latch.
#[derive(Clone, Debug)]
pub struct PauseGate {
    tx: Arc<watch::Sender<bool>>,
}

impl PauseGate {
    /// Creates an open (unpaused) gate.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Closes (`true`) or opens (`false`) the gate.
    ///
    /// Waiters are only woken when the value actually changes.
    pub fn set_paused(&self, paused: bool) {
        self.tx.send_if_modified(|current| {
            if *current == paused {
                false
            } else {
                *current = paused;
                true
            }
        });
    }

    /// Current state of the gate.
    #[inline]
    pub fn is_paused(&self) -> bool {
        *self.tx.borrow()
    }

    /// Returns a token observing this gate.
    pub fn token(&self) -> PauseToken {
        PauseToken {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for PauseGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Job side of the latch.
#[derive(Clone, Debug)]
pub struct PauseToken {
    rx: watch::Receiver<bool>,
}

impl PauseToken {
    /// Non-blocking poll of the gate.
    #[inline]
    pub fn is_paused(&self) -> bool {
        *self.rx.borrow()
    }

    /// Suspends the caller for as long as the gate is closed.
    ///
    /// Returns `Err(JobError::Canceled)` if `cancel` fires while waiting (or had
    /// already fired when the gate is closed). A gate whose controller side was
    /// dropped counts as open.
    pub async fn wait_while_paused(&self, cancel: &CancellationToken) -> Result<(), JobError> {
        let mut rx = self.rx.clone();
        loop {
            if !*rx.borrow_and_update() {
                return Ok(());
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(JobError::Canceled),
                changed = rx.changed() => {
                    if changed.is_err() {
                        return Ok(());
                    }
                }
            }
        }
    }
}
