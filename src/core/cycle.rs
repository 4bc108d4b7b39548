//! # RunCycle: the state shared between one `start` and its matching `stop`.
//!
//! A cycle bundles the cancellation token, the pause gate, the worker and the
//! job handle. The controller is the only one that triggers the token or flips
//! the gate; the job only reads them through the tokens it was given.

use tokio_util::sync::CancellationToken;

use crate::core::context::{ExecutionContext, JobHandle};
use crate::sync::PauseGate;

/// Live run cycle.
pub(crate) struct RunCycle {
    /// Monotonic per-controller identifier.
    pub id: u64,
    pub cancel: CancellationToken,
    pub pause: PauseGate,
    pub context: ExecutionContext,
    pub handle: JobHandle,
}

impl RunCycle {
    /// Triggers cancellation unless the job has already settled.
    ///
    /// Returns `true` if the token was triggered by this call.
    pub fn cancel_if_running(&self) -> bool {
        if self.handle.is_settled() || self.cancel.is_cancelled() {
            return false;
        }
        self.cancel.cancel();
        true
    }
}
