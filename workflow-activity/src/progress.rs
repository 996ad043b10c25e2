//! Progress reporting for running activities.

use tokio::sync::mpsc;

/// Error returned when nobody is listening for progress any more
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("progress channel closed")]
pub struct ProgressClosed;

/// Sends percent-complete values (e.g. `5` when 5% done) from a unit of work
/// to the worker, which forwards changed values to the workflow API.
///
/// The channel holds at most one pending value, so `report` waits while the
/// previous value is still being forwarded.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tx: mpsc::Sender<i32>,
}

impl ProgressReporter {
    /// Create a reporter and the receiving end consumed by the worker
    pub fn channel() -> (Self, mpsc::Receiver<i32>) {
        let (tx, rx) = mpsc::channel(1);
        (Self { tx }, rx)
    }

    /// Report percent complete, waiting for room in the channel
    pub async fn report(&self, percent_complete: i32) -> Result<(), ProgressClosed> {
        self.tx
            .send(percent_complete)
            .await
            .map_err(|_| ProgressClosed)
    }

    /// Report without waiting. A value is dropped if one is already pending.
    pub fn try_report(&self, percent_complete: i32) -> Result<(), ProgressClosed> {
        match self.tx.try_send(percent_complete) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => Ok(()),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(ProgressClosed),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
