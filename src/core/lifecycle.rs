//! # Lifecycle: the host-facing control surface.
//!
//! Hosts (a service manager adapter, a console harness, a test) drive a
//! controller through this trait instead of reaching into its internals.

use crate::core::ServiceStatus;
use crate::error::ControlError;

/// Externally invoked lifecycle operations.
///
/// `start`, `pause` and `resume` return promptly; `stop` blocks the calling
/// thread until the job has drained.
pub trait Lifecycle: Send + Sync {
    /// Starts a new run cycle with the given arguments.
    fn start(&self, args: Vec<String>) -> Result<(), ControlError>;

    /// Cancels the job (if still running) and waits for the worker to drain.
    fn stop(&self);

    /// Closes the pause gate.
    fn pause(&self) -> Result<(), ControlError>;

    /// Opens the pause gate (the host's "continue").
    fn resume(&self) -> Result<(), ControlError>;

    /// Current status.
    fn status(&self) -> ServiceStatus;

    /// Exit code to report once the controller has settled to `Stopped`.
    fn exit_code(&self) -> i32;
}
