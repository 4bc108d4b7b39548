//! # SubscriberSet: synchronous fan-out over multiple subscribers
//!
//! [`SubscriberSet`] delivers each [`Event`] to every subscriber in
//! registration order, on the calling thread, then mirrors it on the [`Bus`].
//!
//! ## What it guarantees
//! - Subscribers see events in the order the controller fires them.
//! - Panics inside subscribers are caught and reported as `SubscriberPanicked`
//!   on the bus (isolation).
//! - The subscriber list is fixed at construction: no late registration, no replay.
//!
//! ## Diagram
//! ```text
//!    emit(&Event)
//!        │
//!        ├──► S1.on_event() ─┐
//!        ├──► S2.on_event() ─┼── panic → Bus.publish(SubscriberPanicked)
//!        ├──► SN.on_event() ─┘
//!        └──► Bus.publish(Event)
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::events::{Bus, Event, EventKind};
use crate::subscribers::Subscribe;

/// Fan-out coordinator for controller observers.
pub struct SubscriberSet {
    subs: Vec<Arc<dyn Subscribe>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates a new set over the given subscribers, mirroring onto `bus`.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        Self { subs, bus }
    }

    /// Delivers an event to every subscriber, then publishes it on the bus.
    pub fn emit(&self, event: Event) {
        for sub in &self.subs {
            let res = catch_unwind(AssertUnwindSafe(|| sub.on_event(&event)));
            if let Err(panic_err) = res {
                let info = {
                    let any = &*panic_err;
                    if let Some(msg) = any.downcast_ref::<&'static str>() {
                        (*msg).to_string()
                    } else if let Some(msg) = any.downcast_ref::<String>() {
                        msg.clone()
                    } else {
                        "unknown panic".to_string()
                    }
                };
                tracing::warn!(subscriber = sub.name(), panic = %info, "subscriber panicked");
                if event.kind != EventKind::SubscriberPanicked {
                    self.bus.publish(Event::subscriber_panicked(sub.name(), info));
                }
            }
        }
        self.bus.publish(event);
    }

    /// Creates a receiver on the mirrored bus.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscribers::Recorder;

    struct Exploding;

    impl Subscribe for Exploding {
        fn on_event(&self, _event: &Event) {
            panic!("exploding subscriber");
        }
        fn name(&self) -> &'static str {
            "exploding"
        }
    }

    #[test]
    fn test_panicking_subscriber_is_isolated() {
        let recorder = Arc::new(Recorder::new());
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Exploding), recorder.clone()];
        let set = SubscriberSet::new(subs, bus);

        set.emit(Event::new(EventKind::JobCompleted));

        assert_eq!(recorder.events().len(), 1);
        let first = rx.try_recv().expect("panic report");
        assert_eq!(first.kind, EventKind::SubscriberPanicked);
        assert_eq!(first.service.as_deref(), Some("exploding"));
        assert_eq!(first.reason.as_deref(), Some("exploding subscriber"));
        let second = rx.try_recv().expect("mirrored event");
        assert_eq!(second.kind, EventKind::JobCompleted);
    }

    #[test]
    fn test_registration_order() {
        let a = Arc::new(Recorder::new());
        let b = Arc::new(Recorder::new());
        let subs: Vec<Arc<dyn Subscribe>> = vec![a.clone(), b.clone()];
        let set = SubscriberSet::new(subs, Bus::new(1));
        assert_eq!(set.len(), 2);
        assert!(!set.is_empty());

        set.emit(Event::new(EventKind::StartRejected));
        assert_eq!(a.events()[0].kind, EventKind::StartRejected);
        assert_eq!(b.events()[0].seq, a.events()[0].seq);
    }
}
