//! # Events emitted by the lifecycle controller.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Status events**: a transition of the service status machine
//! - **Outcome events**: how the job of a run cycle ended
//! - **Diagnostic events**: rejected calls, setup failures, subscriber panics
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! transition pair, the fault and the exit code.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use servicevisor::{Event, EventKind, ServiceStatus};
//!
//! let ev = Event::new(EventKind::StatusChanged)
//!     .with_service("demo")
//!     .with_transition(ServiceStatus::Stopped, ServiceStatus::StartPending);
//!
//! assert_eq!(ev.kind, EventKind::StatusChanged);
//! assert_eq!(ev.to, Some(ServiceStatus::StartPending));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::core::ServiceStatus;
use crate::jobs::Fault;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of controller events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Status events ===
    /// The status machine moved from one value to another.
    ///
    /// Sets:
    /// - `from`, `to`: the transition pair
    StatusChanged,

    // === Outcome events ===
    /// The job returned successfully; an internal stop follows.
    JobCompleted,

    /// The job honoured cancellation.
    JobCanceled,

    /// The job failed.
    ///
    /// Sets:
    /// - `fault`: unwrapped root cause
    /// - `reason`: diagnostic text (terse or full per config)
    /// - `exit_code`: the fault sentinel
    Faulted,

    // === Diagnostic events ===
    /// `start` was rejected because a run cycle is live.
    StartRejected,

    /// Wiring a run cycle failed; the error was swallowed.
    ///
    /// Sets:
    /// - `reason`: error message
    SetupFailed,

    /// A subscriber panicked while handling an event.
    ///
    /// Sets:
    /// - `service`: subscriber name
    /// - `reason`: panic message
    SubscriberPanicked,
}

/// Controller event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Service (or subscriber) name, if applicable.
    pub service: Option<Arc<str>>,
    /// Previous status of a transition.
    pub from: Option<ServiceStatus>,
    /// New status of a transition.
    pub to: Option<ServiceStatus>,
    /// Root cause of a fault.
    pub fault: Option<Fault>,
    /// Human-readable reason (errors, diagnostics, etc.).
    pub reason: Option<Arc<str>>,
    /// Exit code assigned by the controller.
    pub exit_code: Option<i32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            service: None,
            from: None,
            to: None,
            fault: None,
            reason: None,
            exit_code: None,
        }
    }

    /// Attaches a service name.
    #[inline]
    pub fn with_service(mut self, service: impl Into<Arc<str>>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Attaches a status transition.
    #[inline]
    pub fn with_transition(mut self, from: ServiceStatus, to: ServiceStatus) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    /// Attaches a fault.
    #[inline]
    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.fault = Some(fault);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an exit code.
    #[inline]
    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    /// Creates a status transition event.
    #[inline]
    pub fn status_changed(service: &str, from: ServiceStatus, to: ServiceStatus) -> Self {
        Event::new(EventKind::StatusChanged)
            .with_service(service)
            .with_transition(from, to)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_service(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_status_change(&self) -> bool {
        matches!(self.kind, EventKind::StatusChanged)
    }

    #[inline]
    pub fn is_fault(&self) -> bool {
        matches!(self.kind, EventKind::Faulted)
    }
}
