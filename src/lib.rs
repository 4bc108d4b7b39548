//! # servicevisor
//!
//! **Servicevisor** bridges a host's synchronous service lifecycle
//! (start / stop / pause / continue, each called on the host's own thread)
//! onto a single long-running, cancellable, pausable async job.
//!
//! It owns one dedicated background worker, turns each lifecycle call into a
//! cooperative signal for the job, tracks the host-visible status machine and
//! converts the job's outcome into an exit code the host can use for recovery.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   host thread(s)                                   worker thread
//! ┌────────────────────┐                   ┌─────────────────────────────┐
//! │ start(args)        │                   │ current-thread runtime      │
//! │ pause() / resume() │                   │                             │
//! │ stop()  (blocks)   │                   │   job.run(args,             │
//! └─────────┬──────────┘                   │           CancellationToken,│
//!           ▼                              │           PauseToken)       │
//! ┌───────────────────────────────────┐    │             │               │
//! │ ServiceController                 │    │             ▼               │
//! │  - ServiceStatus machine          │───►│   outcome handler           │
//! │  - RunCycle (token, gate, worker) │◄───│   (Completed/Cancelled/     │
//! │  - exit code                      │    │    Faulted)                 │
//! └─────────┬─────────────────────────┘    └─────────────────────────────┘
//!           ▼
//! ┌───────────────────────────────────┐
//! │ SubscriberSet (sync, in order)    │──► LogWriter, Recorder, custom
//! │ Bus (tokio broadcast)             │──► async receivers
//! └───────────────────────────────────┘
//! ```
//!
//! ### Status machine
//! ```text
//! Stopped ─start─► StartPending ─► Running ─pause─► PausePending ─► Paused
//!    ▲                               ▲                                │
//!    │                               └──── Running ◄─ ContinuePending ◄┘ resume
//!    └── Stopped ◄─ StopPending ◄─stop─ (any)
//! ```
//! Every settled status (`Running`, `Paused`, `Stopped`) is reached through
//! its pending status, even when the underlying step fails.
//!
//! ### Outcomes
//! - **Completed**: the controller stops itself; exit code stays `0`.
//! - **Cancelled**: expected result of `stop`; not a fault.
//! - **Faulted**: exit code becomes [`EXIT_SERVICE_SPECIFIC_ERROR`], one
//!   `Faulted` event fires, then the controller stops itself.
//!
//! ## Features
//! | Area              | Description                                                | Key types / traits                         |
//! |-------------------|------------------------------------------------------------|--------------------------------------------|
//! | **Controller**    | Lifecycle operations, status machine, exit code.           | [`ServiceController`], [`Lifecycle`]       |
//! | **Jobs**          | Define the long-running job as a trait impl or a closure.  | [`Job`], [`JobFn`], [`JobRef`]             |
//! | **Signals**       | Cooperative cancellation and pause checkpoints.            | [`PauseToken`], `CancellationToken`        |
//! | **Subscriber API**| Observe status changes and faults.                         | [`Subscribe`], [`Event`], [`Recorder`]     |
//! | **Errors**        | Typed errors for lifecycle calls and job outcomes.         | [`ControlError`], [`JobError`], [`Fault`]  |
//! | **Configuration** | Capabilities and diagnostics settings.                     | [`Config`]                                 |
//!
//! ## Optional features
//! - `logging`: exports the built-in [`LogWriter`] subscriber (on by default).
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use servicevisor::{Config, JobError, JobFn, PauseToken, ServiceController, ServiceStatus};
//!
//! let job = JobFn::arc(
//!     "ticker",
//!     |_args: Vec<String>, cancel: CancellationToken, pause: PauseToken| async move {
//!         loop {
//!             pause.wait_while_paused(&cancel).await?;
//!             tokio::select! {
//!                 _ = cancel.cancelled() => return Err(JobError::Canceled),
//!                 _ = tokio::time::sleep(Duration::from_millis(10)) => {}
//!             }
//!         }
//!     },
//! );
//!
//! let cfg = Config {
//!     can_pause_and_continue: true,
//!     ..Config::named("ticker")
//! };
//! let ctl = ServiceController::builder(cfg, job).build();
//!
//! ctl.start(vec![]).unwrap();
//! ctl.pause().unwrap();
//! assert_eq!(ctl.status(), ServiceStatus::Paused);
//! ctl.resume().unwrap();
//!
//! ctl.stop();
//! assert_eq!(ctl.status(), ServiceStatus::Stopped);
//! assert_eq!(ctl.exit_code(), 0);
//! ```
mod core;
mod error;
mod events;
mod jobs;
mod subscribers;
mod sync;

// ---- Public re-exports ----

pub use core::{
    Config, ControllerBuilder, EXIT_SERVICE_SPECIFIC_ERROR, EXIT_SUCCESS, ExecutionContext,
    JobHandle, Lifecycle, ServiceController, ServiceStatus,
};
pub use error::{ControlError, JobError};
pub use events::{Bus, Event, EventKind};
pub use jobs::{Fault, Job, JobFn, JobOutcome, JobRef};
pub use subscribers::{Recorder, Subscribe, SubscriberSet};
pub use sync::{PauseGate, PauseToken};

// Optional: expose the built-in tracing subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
