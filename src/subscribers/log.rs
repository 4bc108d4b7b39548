//! # Logging subscriber backed by `tracing`.
//!
//! [`LogWriter`] renders controller events as `tracing` records, so they end up
//! wherever the host routes its logs (console, journald, JSON files...).
//!
//! ## Output format
//! ```text
//! INFO  status service=demo from=Stopped to=StartPending
//! ERROR faulted service=demo exit_code=1066 reason="Simulating an application error"
//! DEBUG job cancelled service=demo
//! WARN  start rejected service=demo
//! ```

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Tracing-backed logging subscriber.
///
/// Enabled via the `logging` feature (on by default).
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

impl LogWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Subscribe for LogWriter {
    fn on_event(&self, e: &Event) {
        let service = e.service.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::StatusChanged => {
                if let (Some(from), Some(to)) = (e.from, e.to) {
                    tracing::info!(service, %from, %to, "status");
                }
            }
            EventKind::JobCompleted => {
                tracing::info!(service, "job completed");
            }
            EventKind::JobCanceled => {
                tracing::debug!(service, "job cancelled");
            }
            EventKind::Faulted => {
                tracing::error!(
                    service,
                    exit_code = e.exit_code,
                    reason = e.reason.as_deref().unwrap_or_default(),
                    "faulted"
                );
            }
            EventKind::StartRejected => {
                tracing::warn!(service, "start rejected");
            }
            EventKind::SetupFailed => {
                tracing::error!(
                    service,
                    reason = e.reason.as_deref().unwrap_or_default(),
                    "setup failed"
                );
            }
            EventKind::SubscriberPanicked => {
                tracing::warn!(
                    subscriber = service,
                    reason = e.reason.as_deref().unwrap_or_default(),
                    "subscriber panicked"
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
