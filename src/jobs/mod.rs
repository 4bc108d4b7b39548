//! # Job abstractions and outcomes.
//!
//! - [`Job`] - trait for implementing the long-running, cancellable, pausable job
//! - [`JobFn`] - function-backed job implementation
//! - [`JobRef`] - shared reference to a job (`Arc<dyn Job>`)
//! - [`JobOutcome`], [`Fault`] - how a run cycle ended

mod job;
mod job_fn;
mod outcome;

pub use job::{Job, JobRef};
pub use job_fn::JobFn;
pub use outcome::{Fault, JobOutcome};
