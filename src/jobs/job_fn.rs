//! # Function-backed job (`JobFn`)
//!
//! [`JobFn`] wraps a closure `F: Fn(Vec<String>, CancellationToken, PauseToken) -> Fut`,
//! producing a fresh future per run cycle. State that must survive a restart
//! has to be shared explicitly (e.g. an `Arc<...>` captured by the closure).
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use servicevisor::{JobError, JobFn, JobRef, PauseToken};
//!
//! let job: JobRef = JobFn::arc("worker", |_args: Vec<String>, cancel: CancellationToken, _pause: PauseToken| async move {
//!     if cancel.is_cancelled() {
//!         return Err(JobError::Canceled);
//!     }
//!     Ok(())
//! });
//!
//! assert_eq!(job.name(), "worker");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::JobError;
use crate::jobs::job::Job;
use crate::sync::PauseToken;

/// Function-backed job implementation.
#[derive(Debug)]
pub struct JobFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> JobFn<F> {
    /// Creates a new function-backed job.
    ///
    /// Prefer [`JobFn::arc`] when you immediately need a [`JobRef`](crate::JobRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the job and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Job for JobFn<F>
where
    F: Fn(Vec<String>, CancellationToken, PauseToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), JobError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(
        &self,
        args: Vec<String>,
        cancel: CancellationToken,
        pause: PauseToken,
    ) -> Result<(), JobError> {
        (self.f)(args, cancel, pause).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::PauseGate;

    #[tokio::test]
    async fn test_closure_receives_args() {
        let job = JobFn::arc("echo", |args: Vec<String>, _c: CancellationToken, _p: PauseToken| async move {
            if args == ["--once"] {
                Ok(())
            } else {
                Err(JobError::msg(format!("unexpected args {args:?}")))
            }
        });
        let gate = PauseGate::new();
        let res = job
            .run(vec!["--once".into()], CancellationToken::new(), gate.token())
            .await;
        assert!(res.is_ok());
        assert_eq!(job.name(), "echo");
    }

    #[tokio::test]
    async fn test_fresh_future_per_run() {
        let job = JobFn::arc("cancel-aware", |_a: Vec<String>, cancel: CancellationToken, _p: PauseToken| async move {
            if cancel.is_cancelled() {
                Err(JobError::Canceled)
            } else {
                Ok(())
            }
        });
        let gate = PauseGate::new();
        let cancelled = CancellationToken::new();
        cancelled.cancel();

        assert!(job.run(vec![], cancelled, gate.token()).await.is_err());
        assert!(job.run(vec![], CancellationToken::new(), gate.token()).await.is_ok());
    }
}
