//! # Service status state machine values.
//!
//! [`ServiceStatus`] mirrors the status values a service manager expects. Each
//! variant carries the host's numeric value, so the enum orders the same way the
//! host does.
//!
//! ## Transitions
//! ```text
//! Stopped ──start──► StartPending ──► Running
//! Running ──pause──► PausePending ──► Paused
//! Paused ──resume──► ContinuePending ──► Running
//! Running/Paused ──stop──► StopPending ──► Stopped
//! ```

use std::fmt;

/// Internal status of a controlled service.
///
/// Settled statuses are `Stopped`, `Running` and `Paused`; the rest are pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u32)]
pub enum ServiceStatus {
    #[default]
    Stopped = 1,
    StartPending = 2,
    StopPending = 3,
    Running = 4,
    ContinuePending = 5,
    PausePending = 6,
    Paused = 7,
}

impl ServiceStatus {
    /// True for an in-flight transition.
    #[inline]
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            ServiceStatus::StartPending
                | ServiceStatus::StopPending
                | ServiceStatus::ContinuePending
                | ServiceStatus::PausePending
        )
    }

    /// True for a completed transition.
    #[inline]
    pub fn is_settled(self) -> bool {
        !self.is_pending()
    }

    /// The pending status that must precede this settled status, if any.
    ///
    /// `Running` may be reached through `StartPending` or `ContinuePending`,
    /// so it has no single answer and returns `None`.
    pub fn pending_for(self) -> Option<ServiceStatus> {
        match self {
            ServiceStatus::Stopped => Some(ServiceStatus::StopPending),
            ServiceStatus::Paused => Some(ServiceStatus::PausePending),
            _ => None,
        }
    }

    /// Numeric value as reported to a service manager.
    #[inline]
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            ServiceStatus::Stopped => "stopped",
            ServiceStatus::StartPending => "start_pending",
            ServiceStatus::StopPending => "stop_pending",
            ServiceStatus::Running => "running",
            ServiceStatus::ContinuePending => "continue_pending",
            ServiceStatus::PausePending => "pause_pending",
            ServiceStatus::Paused => "paused",
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceStatus::Stopped => "Stopped",
            ServiceStatus::StartPending => "StartPending",
            ServiceStatus::StopPending => "StopPending",
            ServiceStatus::Running => "Running",
            ServiceStatus::ContinuePending => "ContinuePending",
            ServiceStatus::PausePending => "PausePending",
            ServiceStatus::Paused => "Paused",
        };
        f.write_str(s)
    }
}
