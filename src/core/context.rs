//! # ExecutionContext: one dedicated background worker.
//!
//! An [`ExecutionContext`] owns an OS thread driving a current-thread tokio
//! runtime. Work is scheduled into it from any thread and runs entirely on the
//! worker; the caller only gets a [`JobHandle`] back.
//!
//! ## Architecture
//! ```text
//! host thread                          worker thread ("<service>-worker")
//!   schedule(fut) ── mpsc ──────────►  drive(): JoinSet.spawn(settle(fut))
//!        │                                  │
//!        └─► JobHandle ◄── settle(outcome) ─┘  (continuations run here, inline)
//!
//!   join() ── close queue ──────────►  drain JoinSet → exit thread
//!        └─► thread::join (blocks caller)
//! ```
//!
//! ## Rules
//! - `schedule` never blocks; the job starts on the worker
//! - a panicking job settles its handle as faulted, the worker survives
//! - `join` blocks the **calling** thread until the queue is closed and every
//!   scheduled job (plus its continuations) has settled
//! - `join` is idempotent; concurrent joiners all return after the drain
//! - `join` from the worker itself is refused (it would wait for itself)

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::{runtime, sync::mpsc, task::JoinSet};

use crate::error::{ControlError, JobError};
use crate::jobs::JobOutcome;

type Work = BoxFuture<'static, ()>;

#[cfg(test)]
thread_local! {
    static REFUSE_SPAWN: std::cell::Cell<bool> = const { std::cell::Cell::new(false) };
}

/// Makes the next [`ExecutionContext::spawn`] on this thread fail.
#[cfg(test)]
pub(crate) fn refuse_next_spawn() {
    REFUSE_SPAWN.with(|r| r.set(true));
}
type Continuation = Box<dyn FnOnce(&JobOutcome) + Send + 'static>;

enum HandleState {
    Pending(Vec<Continuation>),
    Settled(JobOutcome),
}

/// Eventual completion of a scheduled job.
///
/// Cloning the handle shares the same completion.
#[derive(Clone)]
pub struct JobHandle {
    state: Arc<Mutex<HandleState>>,
}

impl JobHandle {
    fn pending() -> Self {
        Self {
            state: Arc::new(Mutex::new(HandleState::Pending(Vec::new()))),
        }
    }

    /// True once the job has completed, been cancelled, or faulted.
    pub fn is_settled(&self) -> bool {
        matches!(*self.state.lock(), HandleState::Settled(_))
    }

    /// The outcome, if settled.
    pub fn outcome(&self) -> Option<JobOutcome> {
        match &*self.state.lock() {
            HandleState::Settled(outcome) => Some(outcome.clone()),
            HandleState::Pending(_) => None,
        }
    }

    /// Registers a continuation run once with the outcome.
    ///
    /// Continuations run on the worker thread in registration order. If the
    /// handle has already settled, `f` runs immediately on the calling thread.
    pub fn on_settled(&self, f: impl FnOnce(&JobOutcome) + Send + 'static) {
        let outcome = {
            let mut state = self.state.lock();
            match &mut *state {
                HandleState::Pending(conts) => {
                    conts.push(Box::new(f));
                    return;
                }
                HandleState::Settled(outcome) => outcome.clone(),
            }
        };
        f(&outcome);
    }

    fn settle(&self, outcome: JobOutcome) {
        let conts = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, HandleState::Settled(outcome.clone())) {
                HandleState::Pending(conts) => conts,
                HandleState::Settled(prev) => {
                    *state = HandleState::Settled(prev);
                    return;
                }
            }
        };
        for f in conts {
            f(&outcome);
        }
    }
}

/// Single background worker that serializes scheduled work.
pub struct ExecutionContext {
    name: String,
    tx: Mutex<Option<mpsc::UnboundedSender<Work>>>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
    worker_id: ThreadId,
}

impl ExecutionContext {
    /// Spawns the worker thread and its runtime.
    pub fn spawn(name: impl Into<String>) -> Result<Self, ControlError> {
        let name = name.into();
        #[cfg(test)]
        if REFUSE_SPAWN.with(|r| r.replace(false)) {
            return Err(ControlError::Spawn(std::io::Error::other("spawn refused")));
        }
        let rt = runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ControlError::Spawn)?;
        let (tx, rx) = mpsc::unbounded_channel::<Work>();

        let worker = thread::Builder::new()
            .name(name.clone())
            .spawn(move || rt.block_on(drive(rx)))
            .map_err(ControlError::Spawn)?;
        let worker_id = worker.thread().id();

        Ok(Self {
            name,
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            worker_id,
        })
    }

    /// Name of the worker thread.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when called from the worker thread.
    pub fn is_worker_thread(&self) -> bool {
        thread::current().id() == self.worker_id
    }

    /// Enqueues `job` on the worker and returns a handle to its completion.
    ///
    /// Panics inside `job` settle the handle as faulted.
    pub fn schedule<F>(&self, job: F) -> Result<JobHandle, ControlError>
    where
        F: Future<Output = Result<(), JobError>> + Send + 'static,
    {
        let handle = JobHandle::pending();
        let settle = handle.clone();
        let work: Work = Box::pin(async move {
            let outcome = match AssertUnwindSafe(job).catch_unwind().await {
                Ok(res) => JobOutcome::from_result(res),
                Err(payload) => JobOutcome::from_panic(payload),
            };
            settle.settle(outcome);
        });

        let tx = self.tx.lock();
        let sent = tx.as_ref().map(|tx| tx.send(work).is_ok()).unwrap_or(false);
        if !sent {
            return Err(ControlError::ContextClosed {
                context: self.name.clone(),
            });
        }
        Ok(handle)
    }

    /// Closes the queue and blocks until the worker has drained.
    pub fn join(&self) -> Result<(), ControlError> {
        if self.is_worker_thread() {
            return Err(ControlError::JoinFromWorker {
                context: self.name.clone(),
            });
        }
        self.tx.lock().take();

        // Holding the lock while joining makes concurrent joiners wait for the drain.
        let mut worker = self.worker.lock();
        if let Some(h) = worker.take() {
            tracing::debug!(context = %self.name, "joining worker");
            if h.join().is_err() {
                tracing::warn!(context = %self.name, "worker thread panicked");
            }
        }
        Ok(())
    }

    /// Id of the worker thread.
    pub fn worker_id(&self) -> ThreadId {
        self.worker_id
    }
}

impl Drop for ExecutionContext {
    fn drop(&mut self) {
        // Let the worker drain in the background.
        self.tx.get_mut().take();
    }
}

/// Worker loop: runs scheduled work until the queue closes, then drains.
async fn drive(mut rx: mpsc::UnboundedReceiver<Work>) {
    let mut running = JoinSet::new();
    loop {
        tokio::select! {
            next = rx.recv() => match next {
                Some(work) => {
                    running.spawn(work);
                }
                None => break,
            },
            Some(_) = running.join_next(), if !running.is_empty() => {}
        }
    }
    while running.join_next().await.is_some() {}
}
