//! # Controller configuration.
//!
//! Provides [`Config`], the settings a host hands to
//! [`ServiceController::builder`](crate::ServiceController::builder).
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1 by [`Config::bus_capacity_clamped`]

/// Configuration for a [`ServiceController`](crate::ServiceController).
///
/// ## Field semantics
/// - `service_name`: Names the worker thread and tags log lines
/// - `can_stop`: Capability flag reported to hosts (stop itself is always honoured)
/// - `can_pause_and_continue`: Enables `pause`/`resume`; otherwise they are rejected
/// - `include_fault_detail`: Full diagnostic text (source chain) for faults instead of the terse message
/// - `bus_capacity`: Broadcast ring size for async event consumers (min 1)
#[derive(Clone, Debug)]
pub struct Config {
    /// Logical service name.
    pub service_name: String,

    /// Whether the host may stop the service.
    pub can_stop: bool,

    /// Whether `pause`/`resume` are supported.
    ///
    /// When `false`, both operations return
    /// [`ControlError::Unsupported`](crate::ControlError::Unsupported).
    pub can_pause_and_continue: bool,

    /// Log full fault diagnostics instead of the terse message.
    pub include_fault_detail: bool,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Receivers that lag behind more than `bus_capacity` messages observe
    /// `Lagged` and skip older items.
    pub bus_capacity: usize,
}

impl Config {
    /// Creates a default configuration carrying the given service name.
    pub fn named(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Self::default()
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `service_name = "servicevisor"`
    /// - `can_stop = true`
    /// - `can_pause_and_continue = false`
    /// - `include_fault_detail = false`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            service_name: "servicevisor".to_string(),
            can_stop: true,
            can_pause_and_continue: false,
            include_fault_detail: false,
            bus_capacity: 1024,
        }
    }
}
