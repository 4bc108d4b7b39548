//! # In-memory recorder.
//!
//! [`Recorder`] keeps every event it sees. Test harnesses and interactive
//! hosts use it to inspect the status sequence and fault notifications after
//! the fact.

use parking_lot::Mutex;

use crate::core::ServiceStatus;
use crate::events::{Event, EventKind};
use crate::jobs::Fault;
use crate::subscribers::Subscribe;

/// Subscriber that stores events in arrival order.
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Status sequence: the first `from` followed by every `to`.
    ///
    /// For a fresh controller started and stopped once this reads
    /// `[Stopped, StartPending, Running, StopPending, Stopped]`.
    pub fn statuses(&self) -> Vec<ServiceStatus> {
        let events = self.events.lock();
        let mut out = Vec::new();
        for ev in events.iter().filter(|e| e.kind == EventKind::StatusChanged) {
            if let (Some(from), Some(to)) = (ev.from, ev.to) {
                if out.is_empty() {
                    out.push(from);
                }
                out.push(to);
            }
        }
        out
    }

    /// Faults reported so far.
    pub fn faults(&self) -> Vec<Fault> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| e.fault.clone())
            .collect()
    }

    /// Number of recorded events of the given kind.
    pub fn count(&self, kind: EventKind) -> usize {
        self.events.lock().iter().filter(|e| e.kind == kind).count()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Subscribe for Recorder {
    fn on_event(&self, event: &Event) {
        self.events.lock().push(event.clone());
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}
