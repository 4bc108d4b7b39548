//! # Terminal outcome of a run cycle.
//!
//! The worker converts the job's `Result` (or a panic) into a [`JobOutcome`].
//! Faults are captured as a [`Fault`], which unwraps one level of
//! [`JobError::Aggregate`] so observers see a single root cause.
//!
//! ```text
//! Ok(())                    → Completed
//! Err(Canceled)             → Cancelled
//! Err(Aggregate[e, ..])     → Faulted(Fault { cause: e })
//! Err(other) / panic        → Faulted(Fault { cause: other })
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::JobError;

/// Settled result of a scheduled job.
#[derive(Clone, Debug)]
pub enum JobOutcome {
    /// The job returned `Ok(())`.
    Completed,
    /// The job honoured its cancellation token.
    Cancelled,
    /// The job failed.
    Faulted(Fault),
}

impl JobOutcome {
    /// Maps a job result onto an outcome.
    pub fn from_result(res: Result<(), JobError>) -> Self {
        match res {
            Ok(()) => JobOutcome::Completed,
            Err(JobError::Canceled) => JobOutcome::Cancelled,
            Err(e) => JobOutcome::Faulted(Fault::new(e)),
        }
    }

    /// Maps a panic payload caught on the worker onto a faulted outcome.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(msg) = payload.downcast_ref::<&'static str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        };
        JobOutcome::Faulted(Fault::new(JobError::Panicked { message }))
    }

    /// Short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            JobOutcome::Completed => "completed",
            JobOutcome::Cancelled => "cancelled",
            JobOutcome::Faulted(_) => "faulted",
        }
    }

    #[inline]
    pub fn is_faulted(&self) -> bool {
        matches!(self, JobOutcome::Faulted(_))
    }
}

/// Root cause of a faulted run cycle.
///
/// Cheap to clone; not retained by the controller beyond the notification it produces.
#[derive(Clone)]
pub struct Fault {
    cause: Arc<JobError>,
}

impl Fault {
    /// Wraps an error, keeping only the first inner cause of an aggregate.
    pub fn new(err: JobError) -> Self {
        let cause = match err {
            JobError::Aggregate(mut inner) if !inner.is_empty() => inner.swap_remove(0),
            other => other,
        };
        Self {
            cause: Arc::new(cause),
        }
    }

    /// The unwrapped cause.
    pub fn cause(&self) -> &JobError {
        &self.cause
    }

    /// Terse message (the cause's `Display`).
    pub fn message(&self) -> String {
        self.cause.to_string()
    }

    /// Full diagnostic text including the source chain.
    pub fn detail(&self) -> String {
        self.cause.as_detail()
    }

    /// Diagnostic text selected by `include_detail`.
    pub fn diagnostic(&self, include_detail: bool) -> String {
        if include_detail {
            self.detail()
        } else {
            self.message()
        }
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fault")
            .field("label", &self.cause.as_label())
            .field("message", &self.message())
            .finish()
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.cause, f)
    }
}
