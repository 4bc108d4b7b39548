use std::sync::Arc;

use crate::{
    core::{Config, ServiceController},
    events::Bus,
    jobs::JobRef,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`ServiceController`] around one job.
pub struct ControllerBuilder {
    cfg: Config,
    job: JobRef,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl ControllerBuilder {
    /// Creates a new builder with the given configuration and job.
    pub fn new(cfg: Config, job: JobRef) -> Self {
        Self {
            cfg,
            job,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers are called synchronously, in order, on the thread that
    /// fired the event. Keep them cheap.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Appends one subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the controller in the `Stopped` state.
    pub fn build(self) -> ServiceController {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = SubscriberSet::new(self.subscribers, bus);
        ServiceController::new(self.cfg, self.job, subs)
    }
}
