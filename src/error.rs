//! Error types used by the lifecycle controller and by user jobs.
//!
//! This module defines two main error enums:
//!
//! - [`ControlError`] — errors raised while driving a lifecycle operation.
//! - [`JobError`] — errors raised by the job running on the worker.
//!
//! Both types provide `as_label` for logging/metrics; [`ControlError::as_message`]
//! and [`JobError::as_detail`] render the text that ends up in log records.

use std::io;

use thiserror::Error;

/// # Errors produced by lifecycle operations.
///
/// Only two of them ever cross the public boundary of a lifecycle call:
/// [`ControlError::AlreadyRunning`] from `start` and [`ControlError::Unsupported`]
/// from `pause`/`resume`. The others are setup failures that the controller logs
/// and swallows.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ControlError {
    /// The operation is not enabled for this controller (see `Config::can_pause_and_continue`).
    #[error("service is not configured to support {op}")]
    Unsupported {
        /// Name of the rejected operation.
        op: &'static str,
    },

    /// `start` was invoked while a run cycle is still live.
    #[error("service already has a live run cycle")]
    AlreadyRunning,

    /// The dedicated worker (thread or runtime) could not be created.
    #[error("failed to spawn execution context: {0}")]
    Spawn(#[source] io::Error),

    /// Work was scheduled into a context that has already been joined.
    #[error("execution context '{context}' is closed")]
    ContextClosed {
        /// Name of the execution context.
        context: String,
    },

    /// `join` was invoked from the worker thread it would wait for.
    #[error("execution context '{context}' cannot be joined from its own worker")]
    JoinFromWorker {
        /// Name of the execution context.
        context: String,
    },

    /// OS signal listeners could not be registered by the host runner.
    #[error("failed to register shutdown signals: {0}")]
    Signal(#[source] io::Error),
}

impl ControlError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use servicevisor::ControlError;
    ///
    /// let err = ControlError::Unsupported { op: "pause" };
    /// assert_eq!(err.as_label(), "control_unsupported");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ControlError::Unsupported { .. } => "control_unsupported",
            ControlError::AlreadyRunning => "control_already_running",
            ControlError::Spawn(_) => "control_spawn_failed",
            ControlError::ContextClosed { .. } => "control_context_closed",
            ControlError::JoinFromWorker { .. } => "control_join_from_worker",
            ControlError::Signal(_) => "control_signal_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ControlError::Unsupported { op } => format!("unsupported operation: {op}"),
            ControlError::AlreadyRunning => "start rejected: run cycle already live".to_string(),
            ControlError::Spawn(e) => format!("spawn failed: {e}"),
            ControlError::ContextClosed { context } => format!("context closed: {context}"),
            ControlError::JoinFromWorker { context } => {
                format!("join from worker thread of {context}")
            }
            ControlError::Signal(e) => format!("signal registration failed: {e}"),
        }
    }
}

/// # Errors produced by a job.
///
/// A job reports cooperative cancellation with [`JobError::Canceled`]; any other
/// variant is a fault and drives the controller's fault handling.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum JobError {
    /// The job observed its cancellation token and unwound.
    #[error("job cancelled")]
    Canceled,

    /// The job failed.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),

    /// The job panicked on the worker.
    #[error("job panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text.
        message: String,
    },

    /// Several inner failures grouped together (e.g. from joined sub-jobs).
    #[error("{} errors occurred", .0.len())]
    Aggregate(Vec<JobError>),
}

impl JobError {
    /// Convenience constructor for a plain failure message.
    ///
    /// # Example
    /// ```
    /// use servicevisor::JobError;
    ///
    /// let err = JobError::msg("Simulating an application error");
    /// assert_eq!(err.to_string(), "Simulating an application error");
    /// ```
    pub fn msg(message: impl std::fmt::Display + std::fmt::Debug + Send + Sync + 'static) -> Self {
        JobError::Failed(anyhow::anyhow!(message))
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            JobError::Canceled => "job_canceled",
            JobError::Failed(_) => "job_failed",
            JobError::Panicked { .. } => "job_panicked",
            JobError::Aggregate(_) => "job_aggregate",
        }
    }

    /// Full diagnostic text, including the source chain of wrapped errors.
    pub fn as_detail(&self) -> String {
        match self {
            JobError::Failed(e) => format!("{e:?}"),
            JobError::Aggregate(errors) => {
                let inner: Vec<String> = errors.iter().map(JobError::as_detail).collect();
                format!("{} errors occurred: [{}]", errors.len(), inner.join("; "))
            }
            other => other.to_string(),
        }
    }

    /// True for cooperative cancellation, which is never treated as a fault.
    pub fn is_canceled(&self) -> bool {
        matches!(self, JobError::Canceled)
    }
}
