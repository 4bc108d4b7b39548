//! # Job abstraction.
//!
//! A [`Job`] is the caller-supplied unit of work the controller runs on its
//! dedicated worker. The common handle type is [`JobRef`], an `Arc<dyn Job>`
//! shared between the controller and every run cycle.
//!
//! A job receives the start arguments, a [`CancellationToken`] and a
//! [`PauseToken`]. Both are cooperative: the controller never interrupts a job,
//! it only flips the signals the job is expected to observe.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::JobError;
use crate::sync::PauseToken;

/// Shared handle to a job.
pub type JobRef = Arc<dyn Job>;

/// # Long-running, cancellable, pausable unit of work.
///
/// Implementors should check `cancel` at each iteration of their internal work
/// and await `pause` at safe resumption points.
///
/// Return values map onto the run outcome:
/// - `Ok(())` → completed, the controller stops itself
/// - `Err(JobError::Canceled)` → cancelled, the expected result of a stop
/// - any other `Err` → faulted
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use servicevisor::{Job, JobError, PauseToken};
///
/// struct Heartbeat;
///
/// #[async_trait]
/// impl Job for Heartbeat {
///     fn name(&self) -> &str { "heartbeat" }
///
///     async fn run(
///         &self,
///         _args: Vec<String>,
///         cancel: CancellationToken,
///         pause: PauseToken,
///     ) -> Result<(), JobError> {
///         while !cancel.is_cancelled() {
///             pause.wait_while_paused(&cancel).await?;
///             // beat...
///             break;
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Job: Send + Sync + 'static {
    /// Returns a stable, human-readable job name.
    fn name(&self) -> &str;

    /// Runs the job until completion, cancellation or failure.
    async fn run(
        &self,
        args: Vec<String>,
        cancel: CancellationToken,
        pause: PauseToken,
    ) -> Result<(), JobError>;
}
