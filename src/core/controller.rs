//! # ServiceController: bridges host lifecycle calls onto one async job.
//!
//! The host calls `start`/`stop`/`pause`/`resume` synchronously, each on its own
//! thread. The controller turns those calls into signals for a single job
//! running on a dedicated [`ExecutionContext`], tracks the [`ServiceStatus`]
//! machine, and maps the job's outcome onto an exit code.
//!
//! ## Control flow
//! ```text
//! start(args)
//!   ├─► StartPending
//!   ├─► fresh CancellationToken + PauseGate + ExecutionContext
//!   ├─► schedule job.run(args, cancel, pause) on the worker
//!   ├─► attach outcome handler
//!   └─► Running                           (returns without waiting for the job)
//!
//! pause()  ─► PausePending ─► gate closed ─► Paused
//! resume() ─► ContinuePending ─► gate open ─► Running
//!
//! stop()
//!   ├─► StopPending
//!   ├─► cancel token (only if the job has not settled)
//!   ├─► join worker                        (blocks the caller)
//!   └─► Stopped                            (cycle discarded)
//!
//! outcome handler (worker thread):
//!   Completed ─► JobCompleted ─────────────────────────────► stop() on a helper thread
//!   Cancelled ─► JobCanceled (trace only)
//!   Faulted   ─► exit_code = 1066 ─► log ─► Faulted event ─► stop() on a helper thread
//! ```
//!
//! ## Rules
//! - Lifecycle operations are serialized by an internal (re-entrant) lock.
//! - The worker never takes that lock: a host `stop` holds it while joining the
//!   worker. Lifecycle calls made on the worker (from the job or from a
//!   subscriber reacting to an outcome) are deferred to a helper thread.
//! - Nothing escapes a lifecycle operation except the two caller errors:
//!   `start` on a live cycle and `pause`/`resume` without capability.
//! - Setup failures in `start` are logged and swallowed; the status still
//!   reaches `Running`.
//! - An internal stop only acts on the cycle that produced it; a cycle already
//!   stopped by the host is left alone.

use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};

use parking_lot::{Mutex, ReentrantMutex};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::core::builder::ControllerBuilder;
use crate::core::context::ExecutionContext;
use crate::core::cycle::RunCycle;
use crate::core::{Config, Lifecycle, ServiceStatus};
use crate::error::ControlError;
use crate::events::{Event, EventKind};
use crate::jobs::{Fault, JobOutcome, JobRef};
use crate::subscribers::SubscriberSet;
use crate::sync::PauseGate;

/// Exit code of a clean run (or of a controller that never ran).
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code reported after a faulted job: "the service has returned a
/// service-specific error code".
pub const EXIT_SERVICE_SPECIFIC_ERROR: i32 = 1066;

/// Lifecycle coordinator for one job.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct ServiceController {
    inner: Arc<Inner>,
}

struct Inner {
    cfg: Config,
    job: JobRef,
    subs: SubscriberSet,

    ops: ReentrantMutex<()>,
    status: Mutex<ServiceStatus>,
    cycle: Mutex<Option<Arc<RunCycle>>>,
    /// Worker thread of the latest cycle, with that cycle's id.
    worker: Mutex<Option<(ThreadId, u64)>>,
    exit_code: AtomicI32,
    next_cycle: AtomicU64,
}

impl ServiceController {
    /// Returns a builder for a controller running `job`.
    pub fn builder(cfg: Config, job: JobRef) -> ControllerBuilder {
        ControllerBuilder::new(cfg, job)
    }

    pub(crate) fn new(cfg: Config, job: JobRef, subs: SubscriberSet) -> Self {
        Self {
            inner: Arc::new(Inner {
                cfg,
                job,
                subs,
                ops: ReentrantMutex::new(()),
                status: Mutex::new(ServiceStatus::Stopped),
                cycle: Mutex::new(None),
                worker: Mutex::new(None),
                exit_code: AtomicI32::new(EXIT_SUCCESS),
                next_cycle: AtomicU64::new(1),
            }),
        }
    }

    /// Starts a new run cycle and returns without waiting for the job.
    ///
    /// Returns [`ControlError::AlreadyRunning`] if a cycle is still live; the
    /// status is left untouched in that case.
    ///
    /// Called on the worker thread, the start is deferred to a helper thread and
    /// this returns `Ok(())`; a rejection then only shows up as `StartRejected`.
    pub fn start(&self, args: Vec<String>) -> Result<(), ControlError> {
        self.inner.start(args)
    }

    /// Cancels the job if it is still running and blocks until the worker drains.
    ///
    /// Safe to call repeatedly. When called on the worker thread (from the job
    /// or a subscriber), the stop is handed to a helper thread and this call
    /// returns immediately.
    pub fn stop(&self) {
        self.inner.stop()
    }

    /// Closes the pause gate.
    pub fn pause(&self) -> Result<(), ControlError> {
        self.inner.set_paused(true)
    }

    /// Opens the pause gate.
    pub fn resume(&self) -> Result<(), ControlError> {
        self.inner.set_paused(false)
    }

    /// Current status.
    pub fn status(&self) -> ServiceStatus {
        *self.inner.status.lock()
    }

    /// Exit code: [`EXIT_SUCCESS`] unless the last cycle faulted.
    pub fn exit_code(&self) -> i32 {
        self.inner.exit_code.load(Ordering::SeqCst)
    }

    /// True while a run cycle exists (between `start` and its matching `stop`).
    pub fn has_live_cycle(&self) -> bool {
        self.inner.cycle.lock().is_some()
    }

    /// Controller configuration.
    pub fn config(&self) -> &Config {
        &self.inner.cfg
    }

    /// Name of the controlled job.
    pub fn job_name(&self) -> &str {
        self.inner.job.name()
    }

    /// Async receiver of every event this controller emits from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.inner.subs.subscribe()
    }
}

impl Lifecycle for ServiceController {
    fn start(&self, args: Vec<String>) -> Result<(), ControlError> {
        ServiceController::start(self, args)
    }

    fn stop(&self) {
        ServiceController::stop(self)
    }

    fn pause(&self) -> Result<(), ControlError> {
        ServiceController::pause(self)
    }

    fn resume(&self) -> Result<(), ControlError> {
        ServiceController::resume(self)
    }

    fn status(&self) -> ServiceStatus {
        ServiceController::status(self)
    }

    fn exit_code(&self) -> i32 {
        ServiceController::exit_code(self)
    }
}

impl Inner {
    fn name(&self) -> &str {
        &self.cfg.service_name
    }

    fn start(self: &Arc<Self>, args: Vec<String>) -> Result<(), ControlError> {
        if self.on_worker().is_some() {
            tracing::debug!(service = %self.name(), "start requested from the worker; deferring");
            self.defer("start", move |inner| {
                // Rejections are logged and reported as events by `start` itself.
                let _ = inner.start(args);
            });
            return Ok(());
        }

        let _op = self.ops.lock();

        if self.cycle.lock().is_some() {
            tracing::warn!(service = %self.name(), "start rejected: run cycle already live");
            self.emit(Event::new(EventKind::StartRejected).with_service(self.name()));
            return Err(ControlError::AlreadyRunning);
        }

        self.exit_code.store(EXIT_SUCCESS, Ordering::SeqCst);
        self.set_status(ServiceStatus::StartPending);

        match self.launch(args) {
            Ok(cycle) => {
                tracing::debug!(service = %self.name(), cycle = cycle.id, "run cycle launched");
                *self.cycle.lock() = Some(cycle);
            }
            Err(e) => {
                tracing::error!(
                    service = %self.name(),
                    kind = e.as_label(),
                    error = %e.as_message(),
                    "failed to launch run cycle"
                );
                self.emit(
                    Event::new(EventKind::SetupFailed)
                        .with_service(self.name())
                        .with_reason(e.to_string()),
                );
            }
        }

        self.set_status(ServiceStatus::Running);
        Ok(())
    }

    /// Creates the cycle, schedules the job and attaches the outcome handler.
    fn launch(self: &Arc<Self>, args: Vec<String>) -> Result<Arc<RunCycle>, ControlError> {
        let id = self.next_cycle.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let pause = PauseGate::new();
        let context = ExecutionContext::spawn(format!("{}-worker", self.name()))?;
        *self.worker.lock() = Some((context.worker_id(), id));

        let job = Arc::clone(&self.job);
        let job_cancel = cancel.clone();
        let job_pause = pause.token();
        let handle = context.schedule(async move { job.run(args, job_cancel, job_pause).await })?;

        let weak: Weak<Inner> = Arc::downgrade(self);
        handle.on_settled(move |outcome| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if inner.on_worker() == Some(id) {
                inner.on_job_settled(id, outcome);
            } else {
                // Settled before the handler was attached: we are still inside `start`.
                let outcome = outcome.clone();
                inner.defer("outcome", move |inner| inner.on_job_settled(id, &outcome));
            }
        });

        Ok(Arc::new(RunCycle {
            id,
            cancel,
            pause,
            context,
            handle,
        }))
    }

    /// Outcome handler; runs on the worker thread, or on a helper thread when the
    /// job settled before `launch` attached it.
    fn on_job_settled(self: &Arc<Self>, id: u64, outcome: &JobOutcome) {
        match outcome {
            JobOutcome::Completed => {
                tracing::debug!(service = %self.name(), cycle = id, "job completed");
                self.emit(Event::new(EventKind::JobCompleted).with_service(self.name()));
                self.stop_detached(id);
            }
            JobOutcome::Cancelled => {
                tracing::debug!(service = %self.name(), cycle = id, "job cancelled");
                self.emit(Event::new(EventKind::JobCanceled).with_service(self.name()));
            }
            JobOutcome::Faulted(fault) => {
                self.handle_fault(fault);
                self.stop_detached(id);
            }
        }
    }

    fn handle_fault(&self, fault: &Fault) {
        self.exit_code
            .store(EXIT_SERVICE_SPECIFIC_ERROR, Ordering::SeqCst);

        let reason = fault.diagnostic(self.cfg.include_fault_detail);
        tracing::error!(
            service = %self.name(),
            kind = fault.cause().as_label(),
            exit_code = EXIT_SERVICE_SPECIFIC_ERROR,
            "{reason}"
        );
        self.emit(
            Event::new(EventKind::Faulted)
                .with_service(self.name())
                .with_fault(fault.clone())
                .with_reason(reason)
                .with_exit_code(EXIT_SERVICE_SPECIFIC_ERROR),
        );
    }

    fn stop(self: &Arc<Self>) {
        match self.on_worker() {
            Some(id) => {
                tracing::debug!(service = %self.name(), "stop requested from the worker; deferring");
                self.stop_detached(id);
            }
            None => self.stop_cycle(None),
        }
    }

    /// Cycle id of the worker the caller is running on, if any.
    fn on_worker(&self) -> Option<u64> {
        let me = thread::current().id();
        self.worker
            .lock()
            .and_then(|(tid, id)| (tid == me).then_some(id))
    }

    /// Runs `f` on a short-lived helper thread named after `op`.
    fn defer(self: &Arc<Self>, op: &'static str, f: impl FnOnce(&Arc<Inner>) + Send + 'static) {
        let inner = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name(format!("{}-{op}", self.name()))
            .spawn(move || f(&inner));
        if let Err(e) = spawned {
            tracing::error!(service = %self.name(), op, error = %e, "failed to dispatch lifecycle call");
        }
    }

    /// Issues a stop for cycle `id` from a helper thread.
    fn stop_detached(self: &Arc<Self>, id: u64) {
        self.defer("stop", move |inner| inner.stop_cycle(Some(id)));
    }

    /// Stops the live cycle. With `expected`, only if it is still that cycle.
    fn stop_cycle(&self, expected: Option<u64>) {
        let _op = self.ops.lock();
        let cycle = self.cycle.lock().clone();

        if let Some(id) = expected {
            if cycle.as_ref().map(|c| c.id) != Some(id) {
                tracing::debug!(service = %self.name(), cycle = id, "run cycle already stopped");
                return;
            }
        }

        self.set_status(ServiceStatus::StopPending);
        match &cycle {
            Some(cycle) => {
                if cycle.cancel_if_running() {
                    tracing::debug!(service = %self.name(), cycle = cycle.id, "cancelling job");
                }
                if let Err(e) = cycle.context.join() {
                    tracing::error!(
                        service = %self.name(),
                        kind = e.as_label(),
                        error = %e.as_message(),
                        "failed to join worker"
                    );
                }
                let mut slot = self.cycle.lock();
                if slot.as_ref().is_some_and(|c| Arc::ptr_eq(c, cycle)) {
                    *slot = None;
                }
            }
            None => {
                tracing::warn!(service = %self.name(), "stop without a live run cycle");
            }
        }
        self.set_status(ServiceStatus::Stopped);
    }

    fn set_paused(self: &Arc<Self>, paused: bool) -> Result<(), ControlError> {
        let op = if paused { "pause" } else { "continue" };
        if !self.cfg.can_pause_and_continue {
            return Err(ControlError::Unsupported { op });
        }
        if self.on_worker().is_some() {
            tracing::debug!(service = %self.name(), op, "requested from the worker; deferring");
            self.defer(op, move |inner| {
                let _ = inner.set_paused(paused);
            });
            return Ok(());
        }

        let _op = self.ops.lock();
        let (pending, settled) = if paused {
            (ServiceStatus::PausePending, ServiceStatus::Paused)
        } else {
            (ServiceStatus::ContinuePending, ServiceStatus::Running)
        };

        self.set_status(pending);
        match self.cycle.lock().as_ref() {
            Some(cycle) => cycle.pause.set_paused(paused),
            None => tracing::warn!(service = %self.name(), op, "no live run cycle"),
        }
        self.set_status(settled);
        Ok(())
    }

    /// Updates the status, emitting `StatusChanged` only on an actual change.
    fn set_status(&self, to: ServiceStatus) {
        let from = {
            let mut status = self.status.lock();
            if *status == to {
                return;
            }
            std::mem::replace(&mut *status, to)
        };
        self.emit(Event::status_changed(self.name(), from, to));
    }

    fn emit(&self, ev: Event) {
        self.subs.emit(ev);
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(cycle) = self.cycle.get_mut().take() {
            cycle.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;
    use std::sync::atomic::AtomicUsize;
    use std::time::{Duration, Instant};

    use super::*;
    use crate::error::JobError;
    use crate::jobs::JobFn;
    use crate::subscribers::{Recorder, Subscribe};
    use crate::sync::PauseToken;

    use ServiceStatus::*;

    fn wait_until(what: &str, cond: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            assert!(Instant::now() < deadline, "timed out waiting for {what}");
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn controller(cfg: Config, job: JobRef) -> (ServiceController, Arc<Recorder>) {
        let rec = Arc::new(Recorder::new());
        let ctl = ServiceController::builder(cfg, job)
            .with_subscriber(rec.clone())
            .build();
        (ctl, rec)
    }

    fn pausable() -> Config {
        Config {
            can_pause_and_continue: true,
            ..Config::named("test-svc")
        }
    }

    /// Ticks until cancelled, honouring the pause gate.
    fn ticker(ticks: Arc<AtomicUsize>) -> JobRef {
        JobFn::arc(
            "ticker",
            move |_args: Vec<String>, cancel: CancellationToken, pause: PauseToken| {
                let ticks = ticks.clone();
                async move {
                    loop {
                        if cancel.is_cancelled() {
                            return Err(JobError::Canceled);
                        }
                        pause.wait_while_paused(&cancel).await?;
                        ticks.fetch_add(1, Ordering::SeqCst);
                        tokio::select! {
                            _ = cancel.cancelled() => return Err(JobError::Canceled),
                            _ = tokio::time::sleep(Duration::from_millis(5)) => {}
                        }
                    }
                }
            },
        )
    }

    /// Counts down `count` iterations then fails unless cancelled.
    fn countdown(count: usize, delay: Duration, iterations: Arc<AtomicUsize>) -> JobRef {
        JobFn::arc(
            "countdown",
            move |_args: Vec<String>, cancel: CancellationToken, pause: PauseToken| {
                let iterations = iterations.clone();
                async move {
                    for _ in 0..count {
                        if cancel.is_cancelled() {
                            return Err(JobError::Canceled);
                        }
                        iterations.fetch_add(1, Ordering::SeqCst);
                        tokio::select! {
                            _ = cancel.cancelled() => return Err(JobError::Canceled),
                            _ = tokio::time::sleep(delay) => {}
                        }
                        pause.wait_while_paused(&cancel).await?;
                    }
                    if cancel.is_cancelled() {
                        return Err(JobError::Canceled);
                    }
                    Err(JobError::msg("Simulating an application error"))
                }
            },
        )
    }

    fn quick(res: fn() -> Result<(), JobError>) -> JobRef {
        JobFn::arc(
            "quick",
            move |_args: Vec<String>, _cancel: CancellationToken, _pause: PauseToken| async move {
                res()
            },
        )
    }

    fn settled_stopped(ctl: &ServiceController) -> bool {
        ctl.status() == Stopped && !ctl.has_live_cycle()
    }

    #[test]
    fn test_start_then_stop_walks_pending_states() {
        let (ctl, rec) = controller(Config::default(), ticker(Arc::default()));
        assert_eq!(ctl.status(), Stopped);

        ctl.start(vec![]).unwrap();
        assert_eq!(ctl.status(), Running);
        assert!(ctl.has_live_cycle());

        ctl.stop();
        assert_eq!(ctl.status(), Stopped);
        assert!(!ctl.has_live_cycle());
        assert_eq!(
            rec.statuses(),
            vec![Stopped, StartPending, Running, StopPending, Stopped]
        );
        assert_eq!(ctl.exit_code(), EXIT_SUCCESS);
        assert_eq!(rec.count(EventKind::JobCanceled), 1);
        assert!(rec.faults().is_empty());
    }

    #[test]
    fn test_every_settled_status_follows_its_pending_status() {
        let (ctl, rec) = controller(pausable(), ticker(Arc::default()));
        ctl.start(vec![]).unwrap();
        ctl.pause().unwrap();
        ctl.resume().unwrap();
        ctl.pause().unwrap();
        ctl.resume().unwrap();
        ctl.stop();

        let seq = rec.statuses();
        for pair in seq.windows(2) {
            let expected_pending = match pair[1].pending_for() {
                Some(pending) => vec![pending],
                None if pair[1] == Running => vec![StartPending, ContinuePending],
                None => continue,
            };
            assert!(
                expected_pending.contains(&pair[0]),
                "{:?} reached without its pending status",
                pair
            );
        }
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (ctl, rec) = controller(Config::default(), ticker(Arc::default()));
        ctl.start(vec![]).unwrap();
        ctl.stop();
        assert_eq!(ctl.status(), Stopped);
        ctl.stop();
        assert_eq!(ctl.status(), Stopped);
        assert_eq!(rec.count(EventKind::JobCanceled), 1);
        assert_eq!(ctl.exit_code(), EXIT_SUCCESS);
    }

    #[test]
    fn test_stop_before_start_settles_stopped() {
        let (ctl, rec) = controller(Config::default(), ticker(Arc::default()));
        ctl.stop();
        assert_eq!(ctl.status(), Stopped);
        assert_eq!(rec.statuses(), vec![Stopped, StopPending, Stopped]);
        assert_eq!(ctl.exit_code(), EXIT_SUCCESS);
    }

    #[test]
    fn test_pause_and_resume_twice_in_succession() {
        let (ctl, rec) = controller(pausable(), ticker(Arc::default()));
        ctl.start(vec![]).unwrap();
        rec.clear();

        ctl.pause().unwrap();
        ctl.resume().unwrap();
        ctl.pause().unwrap();
        ctl.resume().unwrap();

        assert_eq!(
            rec.statuses(),
            vec![
                Running,
                PausePending,
                Paused,
                ContinuePending,
                Running,
                PausePending,
                Paused,
                ContinuePending,
                Running
            ]
        );
        ctl.stop();
    }

    #[test]
    fn test_resume_releases_paused_job() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let (ctl, rec) = controller(pausable(), ticker(ticks.clone()));
        ctl.start(vec![]).unwrap();
        wait_until("first tick", || ticks.load(Ordering::SeqCst) > 0);

        ctl.pause().unwrap();
        assert_eq!(ctl.status(), Paused);
        // One tick may already be past the gate.
        thread::sleep(Duration::from_millis(30));
        let frozen = ticks.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(ticks.load(Ordering::SeqCst), frozen);

        ctl.resume().unwrap();
        assert_eq!(ctl.status(), Running);
        wait_until("ticks after resume", || ticks.load(Ordering::SeqCst) > frozen);

        ctl.stop();
        assert_eq!(rec.count(EventKind::JobCanceled), 1);
        assert!(rec.faults().is_empty());
    }

    #[test]
    fn test_stop_while_paused_cancels_waiting_job() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let (ctl, rec) = controller(pausable(), ticker(ticks.clone()));
        ctl.start(vec![]).unwrap();
        wait_until("first tick", || ticks.load(Ordering::SeqCst) > 0);
        ctl.pause().unwrap();

        ctl.stop();
        assert_eq!(ctl.status(), Stopped);
        assert_eq!(rec.count(EventKind::JobCanceled), 1);
        assert_eq!(ctl.exit_code(), EXIT_SUCCESS);
    }

    #[test]
    fn test_pause_unsupported_is_rejected() {
        let (ctl, rec) = controller(Config::default(), ticker(Arc::default()));
        ctl.start(vec![]).unwrap();
        rec.clear();

        let err = ctl.pause().unwrap_err();
        assert!(matches!(err, ControlError::Unsupported { op: "pause" }));
        let err = ctl.resume().unwrap_err();
        assert!(matches!(err, ControlError::Unsupported { op: "continue" }));
        assert_eq!(ctl.status(), Running);
        assert!(rec.statuses().is_empty());
        ctl.stop();
    }

    #[test]
    fn test_fault_sets_sentinel_and_notifies_once() {
        let iterations = Arc::new(AtomicUsize::new(0));
        let job = countdown(10, Duration::from_millis(5), iterations.clone());
        let (ctl, rec) = controller(Config::default(), job);

        ctl.start(vec![]).unwrap();
        wait_until("internal stop", || settled_stopped(&ctl));

        assert_eq!(iterations.load(Ordering::SeqCst), 10);
        assert_eq!(ctl.exit_code(), EXIT_SERVICE_SPECIFIC_ERROR);
        let faults = rec.faults();
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].message(), "Simulating an application error");
        assert_eq!(rec.count(EventKind::Faulted), 1);

        let seq = rec.statuses();
        assert_eq!(&seq[seq.len() - 2..], &[StopPending, Stopped]);
        let fault_seq = rec
            .events()
            .iter()
            .find(|e| e.is_fault())
            .map(|e| e.seq)
            .unwrap();
        let stopped_seq = rec
            .events()
            .iter()
            .rfind(|e| e.to == Some(Stopped))
            .map(|e| e.seq)
            .unwrap();
        assert!(fault_seq < stopped_seq);
    }

    #[test]
    fn test_stop_mid_countdown_is_not_a_fault() {
        let iterations = Arc::new(AtomicUsize::new(0));
        let job = countdown(10, Duration::from_millis(20), iterations.clone());
        let (ctl, rec) = controller(Config::default(), job);

        ctl.start(vec![]).unwrap();
        wait_until("third iteration", || iterations.load(Ordering::SeqCst) >= 3);
        ctl.stop();

        assert_eq!(ctl.status(), Stopped);
        assert!(iterations.load(Ordering::SeqCst) < 10);
        assert!(rec.faults().is_empty());
        assert_eq!(ctl.exit_code(), EXIT_SUCCESS);
        assert_ne!(ctl.exit_code(), EXIT_SERVICE_SPECIFIC_ERROR);
    }

    #[test]
    fn test_completed_job_stops_itself() {
        let (ctl, rec) = controller(Config::default(), quick(|| Ok(())));
        ctl.start(vec![]).unwrap();
        wait_until("internal stop", || settled_stopped(&ctl));

        assert_eq!(ctl.exit_code(), EXIT_SUCCESS);
        assert!(rec.faults().is_empty());
        assert_eq!(rec.count(EventKind::JobCompleted), 1);
        assert_eq!(rec.count(EventKind::JobCanceled), 0);
        assert_eq!(rec.statuses().last(), Some(&Stopped));
    }

    #[test]
    fn test_start_while_live_is_rejected() {
        let (ctl, rec) = controller(Config::default(), ticker(Arc::default()));
        ctl.start(vec![]).unwrap();
        let before = rec.statuses();

        let err = ctl.start(vec![]).unwrap_err();
        assert!(matches!(err, ControlError::AlreadyRunning));
        assert_eq!(rec.count(EventKind::StartRejected), 1);
        assert_eq!(rec.statuses(), before);
        assert_eq!(ctl.status(), Running);
        ctl.stop();
    }

    #[test]
    fn test_restart_uses_fresh_cycle() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let (ctl, rec) = controller(pausable(), ticker(ticks.clone()));
        ctl.start(vec![]).unwrap();
        ctl.pause().unwrap();
        ctl.stop();

        ticks.store(0, Ordering::SeqCst);
        ctl.start(vec![]).unwrap();
        wait_until("ticks in second cycle", || ticks.load(Ordering::SeqCst) > 0);
        ctl.stop();
        assert_eq!(rec.count(EventKind::JobCanceled), 2);
    }

    #[test]
    fn test_restart_after_fault_resets_exit_code() {
        let runs = Arc::new(AtomicUsize::new(0));
        let r = runs.clone();
        let job = JobFn::arc(
            "fails-once",
            move |_args: Vec<String>, cancel: CancellationToken, _pause: PauseToken| {
                let first = r.fetch_add(1, Ordering::SeqCst) == 0;
                async move {
                    if first {
                        return Err(JobError::msg("boom"));
                    }
                    cancel.cancelled().await;
                    Err(JobError::Canceled)
                }
            },
        );
        let (ctl, rec) = controller(Config::default(), job);
        ctl.start(vec![]).unwrap();
        wait_until("fault stop", || settled_stopped(&ctl));
        assert_eq!(ctl.exit_code(), EXIT_SERVICE_SPECIFIC_ERROR);

        ctl.start(vec![]).unwrap();
        ctl.stop();
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert_eq!(rec.count(EventKind::JobCanceled), 1);
        assert_eq!(ctl.exit_code(), EXIT_SUCCESS);
    }

    #[test]
    fn test_aggregate_fault_reports_first_cause() {
        let job = quick(|| {
            Err(JobError::Aggregate(vec![
                JobError::msg("first"),
                JobError::msg("second"),
            ]))
        });
        let (ctl, rec) = controller(Config::default(), job);
        ctl.start(vec![]).unwrap();
        wait_until("fault stop", || settled_stopped(&ctl));

        let faults = rec.faults();
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].message(), "first");
    }

    #[test]
    fn test_panicking_job_is_a_fault() {
        let job = quick(|| -> Result<(), JobError> { panic!("job exploded") });
        let (ctl, rec) = controller(Config::default(), job);
        ctl.start(vec![]).unwrap();
        wait_until("fault stop", || settled_stopped(&ctl));

        assert_eq!(ctl.exit_code(), EXIT_SERVICE_SPECIFIC_ERROR);
        assert_eq!(rec.faults()[0].cause().as_label(), "job_panicked");
    }

    #[test]
    fn test_fault_detail_switch() {
        let job = quick(|| {
            Err(JobError::Failed(
                anyhow::anyhow!("connection reset").context("syncing ledger"),
            ))
        });
        let cfg = Config {
            include_fault_detail: true,
            ..Config::default()
        };
        let (ctl, rec) = controller(cfg, job);
        ctl.start(vec![]).unwrap();
        wait_until("fault stop", || settled_stopped(&ctl));

        let ev = rec.events().into_iter().find(|e| e.is_fault()).unwrap();
        let reason = ev.reason.as_deref().unwrap();
        assert!(reason.contains("syncing ledger"));
        assert!(reason.contains("connection reset"));
        assert_eq!(ev.exit_code, Some(EXIT_SERVICE_SPECIFIC_ERROR));
        assert_eq!(ev.fault.unwrap().message(), "syncing ledger");
    }

    #[test]
    fn test_args_reach_the_job() {
        let job = JobFn::arc(
            "args",
            |args: Vec<String>, _cancel: CancellationToken, _pause: PauseToken| async move {
                if args == ["--port", "8080"] {
                    Ok(())
                } else {
                    Err(JobError::msg(format!("bad args {args:?}")))
                }
            },
        );
        let (ctl, rec) = controller(Config::default(), job);
        ctl.start(vec!["--port".into(), "8080".into()]).unwrap();
        wait_until("internal stop", || settled_stopped(&ctl));
        assert!(rec.faults().is_empty());
    }

    #[test]
    fn test_stop_from_inside_the_job() {
        let handle: Arc<OnceLock<ServiceController>> = Arc::new(OnceLock::new());
        let h = handle.clone();
        let job = JobFn::arc(
            "self-stopping",
            move |_args: Vec<String>, cancel: CancellationToken, _pause: PauseToken| {
                let h = h.clone();
                async move {
                    if let Some(ctl) = h.get() {
                        ctl.stop();
                    }
                    cancel.cancelled().await;
                    Err(JobError::Canceled)
                }
            },
        );
        let (ctl, rec) = controller(Config::default(), job);
        let _ = handle.set(ctl.clone());

        ctl.start(vec![]).unwrap();
        wait_until("self stop", || settled_stopped(&ctl));
        assert_eq!(rec.count(EventKind::JobCanceled), 1);
        assert_eq!(ctl.exit_code(), EXIT_SUCCESS);
    }

    #[test]
    fn test_bus_mirrors_status_changes() {
        let (ctl, _rec) = controller(Config::default(), ticker(Arc::default()));
        let mut rx = ctl.subscribe();
        ctl.start(vec![]).unwrap();
        ctl.stop();

        let mut seen = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if let Some(to) = ev.to {
                seen.push(to);
            }
        }
        assert_eq!(seen, vec![StartPending, Running, StopPending, Stopped]);
    }

    struct Reentrant {
        ctl: OnceLock<ServiceController>,
    }

    impl Subscribe for Reentrant {
        fn on_event(&self, ev: &Event) {
            if ev.to == Some(Running) {
                if let Some(ctl) = self.ctl.get() {
                    assert_eq!(ctl.status(), Running);
                }
            }
        }
    }

    /// Restarts the service once, from the subscriber callback, after a fault.
    struct Restarter {
        ctl: OnceLock<ServiceController>,
        fired: AtomicUsize,
    }

    impl Subscribe for Restarter {
        fn on_event(&self, ev: &Event) {
            if ev.kind != EventKind::Faulted || self.fired.fetch_add(1, Ordering::SeqCst) > 0 {
                return;
            }
            if let Some(ctl) = self.ctl.get() {
                assert!(ctl.start(vec![]).is_ok());
            }
        }
    }

    #[test]
    fn test_restart_from_fault_subscriber_during_host_stop() {
        let job = JobFn::arc(
            "flaky-shutdown",
            |_args: Vec<String>, cancel: CancellationToken, _pause: PauseToken| async move {
                cancel.cancelled().await;
                Err(JobError::msg("flush failed during shutdown"))
            },
        );
        let sub = Arc::new(Restarter {
            ctl: OnceLock::new(),
            fired: AtomicUsize::new(0),
        });
        let rec = Arc::new(Recorder::new());
        let ctl = ServiceController::builder(Config::named("restarter"), job)
            .with_subscriber(sub.clone())
            .with_subscriber(rec.clone())
            .build();
        let _ = sub.ctl.set(ctl.clone());

        ctl.start(vec![]).unwrap();
        let (done_tx, done_rx) = std::sync::mpsc::channel();
        let host = ctl.clone();
        thread::spawn(move || {
            host.stop();
            let _ = done_tx.send(());
        });
        done_rx
            .recv_timeout(Duration::from_secs(3))
            .expect("host stop must not wait on the subscriber");

        // The deferred start runs once the host stop has released the controller.
        wait_until("restarted cycle", || {
            ctl.has_live_cycle() && ctl.status() == Running
        });
        assert_eq!(sub.fired.load(Ordering::SeqCst), 1);
        assert_eq!(
            &rec.statuses()[..5],
            &[Stopped, StartPending, Running, StopPending, Stopped]
        );

        ctl.stop();
        assert_eq!(ctl.status(), Stopped);
        assert_eq!(ctl.exit_code(), EXIT_SERVICE_SPECIFIC_ERROR);
        assert_eq!(rec.count(EventKind::Faulted), 2);
    }

    /// Pauses the service from the worker when the job signals it.
    struct PauseOnCancel {
        ctl: OnceLock<ServiceController>,
    }

    impl Subscribe for PauseOnCancel {
        fn on_event(&self, ev: &Event) {
            if ev.kind == EventKind::JobCanceled {
                if let Some(ctl) = self.ctl.get() {
                    assert!(ctl.pause().is_ok());
                }
            }
        }
    }

    #[test]
    fn test_pause_from_worker_does_not_block_stop() {
        let sub = Arc::new(PauseOnCancel {
            ctl: OnceLock::new(),
        });
        let ctl = ServiceController::builder(pausable(), ticker(Arc::default()))
            .with_subscriber(sub.clone())
            .build();
        let _ = sub.ctl.set(ctl.clone());

        ctl.start(vec![]).unwrap();
        ctl.stop();
        // The deferred pause settles after the stop, with no cycle left to gate.
        wait_until("deferred pause", || ctl.status() == Paused);
        assert!(!ctl.has_live_cycle());
    }

    #[test]
    fn test_setup_failure_still_reaches_running() {
        let (ctl, rec) = controller(Config::default(), ticker(Arc::default()));

        crate::core::context::refuse_next_spawn();
        ctl.start(vec![]).unwrap();

        assert_eq!(ctl.status(), Running);
        assert_eq!(rec.statuses(), vec![Stopped, StartPending, Running]);
        assert_eq!(rec.count(EventKind::SetupFailed), 1);
        let ev = rec
            .events()
            .into_iter()
            .find(|e| e.kind == EventKind::SetupFailed)
            .unwrap();
        assert!(ev.reason.as_deref().unwrap().contains("spawn refused"));
        assert!(!ctl.has_live_cycle());

        ctl.stop();
        assert_eq!(ctl.status(), Stopped);
        assert_eq!(ctl.exit_code(), EXIT_SUCCESS);

        // The next start gets a working cycle.
        ctl.start(vec![]).unwrap();
        assert!(ctl.has_live_cycle());
        ctl.stop();
        assert_eq!(rec.count(EventKind::JobCanceled), 1);
    }

    #[test]
    fn test_subscriber_may_read_status() {
        let sub = Arc::new(Reentrant {
            ctl: OnceLock::new(),
        });
        let ctl = ServiceController::builder(Config::default(), ticker(Arc::default()))
            .with_subscriber(sub.clone())
            .build();
        let _ = sub.ctl.set(ctl.clone());
        ctl.start(vec![]).unwrap();
        ctl.stop();
        assert_eq!(ctl.status(), Stopped);
    }
}
