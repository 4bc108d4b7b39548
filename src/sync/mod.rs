//! Cooperative signalling primitives shared between the controller and the job.
//!
//! - [`PauseGate`] / [`PauseToken`] a latch flipped by `pause`/`resume`
//!
//! Cancellation uses [`tokio_util::sync::CancellationToken`] directly: the
//! controller is its only trigger, the job only polls or awaits it.

mod pause;

pub use pause::{PauseGate, PauseToken};
