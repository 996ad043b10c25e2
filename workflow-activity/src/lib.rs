//! Activity authoring API for the workflow client.
//!
//! This crate provides the handles a unit of work receives from the activity
//! worker: the [`ActivityContext`] with its cancellation signal, and the
//! [`ProgressReporter`] for percent-complete updates.

pub mod context;
pub mod progress;

pub use context::*;
pub use progress::*;
