//! Runtime core: the controller and the machinery it drives.
//!
//! The public entry point is [`ServiceController`], which maps host lifecycle
//! calls onto one job running in an [`ExecutionContext`].
//!
//! Internal modules:
//! - [`controller`]: status machine, lifecycle operations, outcome handling;
//! - [`context`]: dedicated worker thread with its own runtime;
//! - [`cycle`]: the token/gate/worker bundle of one `start`..`stop`;
//! - [`host`]: signal-driven runner for plain processes;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod builder;
mod config;
mod context;
mod controller;
mod cycle;
mod host;
mod lifecycle;
mod shutdown;
mod status;

pub use builder::ControllerBuilder;
pub use config::Config;
pub use context::{ExecutionContext, JobHandle};
pub use controller::{EXIT_SERVICE_SPECIFIC_ERROR, EXIT_SUCCESS, ServiceController};
pub use lifecycle::Lifecycle;
pub use status::ServiceStatus;
