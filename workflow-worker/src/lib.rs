//! Activity worker for the workflow API.
//!
//! This crate runs a unit of work on behalf of the workflow API: it
//! heartbeats the activity, forwards progress, reacts to cancellation
//! requests, and reports exactly one terminal outcome.

pub mod heartbeat;
pub mod options;
mod progress;
pub mod worker;

pub use options::*;
pub use worker::*;

pub use workflow_activity::{ActivityContext, ActivityInfo, ProgressClosed, ProgressReporter};
pub use tokio_util::sync::CancellationToken;
