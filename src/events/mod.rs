//! Controller events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publisher**: the controller only (status transitions, outcomes, diagnostics).
//! - **Consumers**: synchronous subscribers via [`SubscriberSet`](crate::SubscriberSet),
//!   async receivers via [`Bus::subscribe`].

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
