//! # Event subscribers for the lifecycle controller.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and built-in implementations.
//!
//! ## Architecture
//! ```text
//! ServiceController ── emit(Event) ──► SubscriberSet
//!                                          │
//!                                          ├──► Subscribe::on_event(&Event)   (sync, in order)
//!                                          │         │
//!                                          │    ┌────┴────┬──────────┐
//!                                          │    ▼         ▼          ▼
//!                                          │  LogWriter  Recorder  Custom
//!                                          │
//!                                          └──► Bus (broadcast, async receivers)
//! ```

#[cfg(feature = "logging")]
mod log;
mod recorder;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use recorder::Recorder;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
