//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for plugging observers into the
//! controller: a host event log, a console renderer, a test recorder.
//!
//! ## Contract
//! - `on_event` runs **synchronously** on the thread that detected the change
//!   (a host thread calling a lifecycle operation, or the worker settling a job).
//! - Implementations must be quick; hand heavy work off to a queue or use
//!   [`Bus`](crate::Bus) instead. Reading the controller status is fine.
//! - A panic inside `on_event` is caught and reported; other subscribers still run.
//!
//! ## Example (skeleton)
//! ```rust
//! use servicevisor::{Event, EventKind, Subscribe};
//!
//! struct Audit;
//!
//! impl Subscribe for Audit {
//!     fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::Faulted {
//!             // write audit record...
//!         }
//!     }
//!     fn name(&self) -> &'static str { "audit" }
//! }
//! ```

use crate::events::Event;

/// Contract for event subscribers.
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this subscriber.
    fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
