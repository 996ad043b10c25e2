//! Activity worker.
//!
//! [`Worker::run`] executes one unit of work and reports its status and
//! progress to the workflow API. While the work runs the worker heartbeats
//! the activity, forwards changed percent-complete values, and watches for a
//! cancellation request coming back on a heartbeat. Exactly one terminal
//! report (success, failure or cancellation) is sent per run.

use std::any::Any;
use std::fmt::Display;
use std::future::Future;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::instrument::WithSubscriber;
use tracing::Instrument;
use workflow_activity::{ActivityContext, ActivityInfo, ProgressReporter};
use workflow_client::SharedClient;

use crate::heartbeat::HeartbeatManager;
use crate::options::WorkerOptions;
use crate::progress::spawn_progress_forwarder;

/// Reason sent with every cancellation report
pub const CANCELLATION_REASON: &str = "Cancel requested";

/// Cancellation details when the work finished normally after cancellation
pub const WORK_COMPLETED_DETAILS: &str = "Work completed successfully";

/// Cancellation details when the work did not stop within the grace period
pub const CANCELLATION_TIMEOUT_DETAILS: &str = "Work cancelled after timeout";

/// Terminal outcome of one run, as reported to the workflow API
#[derive(Debug, Clone, PartialEq)]
pub enum ActivityOutcome {
    Succeeded(Value),
    Failed { reason: String },
    Cancelled { reason: String, details: String },
}

impl ActivityOutcome {
    fn cancelled(details: impl Into<String>) -> Self {
        Self::Cancelled {
            reason: CANCELLATION_REASON.to_string(),
            details: details.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// What the work task hands back: the serialized result, or an error message
type WorkResult = Result<Value, String>;

/// Executes units of work and reports status and progress through a
/// [`workflow_client::Client`].
///
/// One worker can serve any number of sequential or concurrent runs; each
/// run gets its own heartbeat loop, progress forwarder and cancellation
/// token.
#[derive(Clone)]
pub struct Worker {
    client: SharedClient,
    options: WorkerOptions,
}

impl Worker {
    pub fn new(client: SharedClient) -> Self {
        Self::with_options(client, WorkerOptions::default())
    }

    pub fn with_options(client: SharedClient, options: WorkerOptions) -> Self {
        Self { client, options }
    }

    pub fn options(&self) -> &WorkerOptions {
        &self.options
    }

    /// Execute `work` and report back to the workflow API.
    ///
    /// `work` receives an [`ActivityContext`], cancelled when a heartbeat
    /// reports a cancellation request or when `parent` is cancelled, and a
    /// [`ProgressReporter`] for percent-complete updates. It should watch the
    /// context and stop promptly once cancelled.
    ///
    /// Returns once the terminal outcome has been reported (a failed report
    /// is logged) and heartbeating has stopped. Nothing is returned to the
    /// caller; see [`Worker::run_with_outcome`] to observe the outcome.
    pub async fn run<F, Fut, T, E>(
        &self,
        parent: &CancellationToken,
        workflow_id: &str,
        activity_id: &str,
        task_token: &str,
        work: F,
    ) where
        F: FnOnce(ActivityContext, ProgressReporter) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Serialize + Send + 'static,
        E: Display + Send + 'static,
    {
        self.run_with_outcome(parent, workflow_id, activity_id, task_token, work)
            .await;
    }

    /// Same as [`Worker::run`], returning the outcome that was reported
    pub async fn run_with_outcome<F, Fut, T, E>(
        &self,
        parent: &CancellationToken,
        workflow_id: &str,
        activity_id: &str,
        task_token: &str,
        work: F,
    ) -> ActivityOutcome
    where
        F: FnOnce(ActivityContext, ProgressReporter) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Serialize + Send + 'static,
        E: Display + Send + 'static,
    {
        let info = ActivityInfo::new(workflow_id, activity_id, task_token);
        match &self.options.log_dispatch {
            Some(dispatch) => {
                let span = tracing::dispatcher::with_default(dispatch, || activity_span(&info));
                self.execute(parent, info, work)
                    .instrument(span)
                    .with_subscriber(dispatch.clone())
                    .await
            }
            None => {
                let span = activity_span(&info);
                self.execute(parent, info, work).instrument(span).await
            }
        }
    }

    async fn execute<F, Fut, T, E>(
        &self,
        parent: &CancellationToken,
        info: ActivityInfo,
        work: F,
    ) -> ActivityOutcome
    where
        F: FnOnce(ActivityContext, ProgressReporter) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Serialize + Send + 'static,
        E: Display + Send + 'static,
    {
        let cancel = parent.child_token();
        let (progress, progress_rx) = ProgressReporter::channel();
        let (stop_tx, stop_rx) = oneshot::channel();

        let heartbeat_manager = HeartbeatManager::new(
            self.client.clone(),
            self.options.effective_heartbeat_interval(),
        );
        let heartbeat = heartbeat_manager.start_heartbeat(
            info.task_token.clone(),
            info.activity_id.clone(),
            cancel.clone(),
            stop_rx,
        );

        // Not awaited: it finishes once the work drops its reporter
        spawn_progress_forwarder(
            self.client.clone(),
            info.workflow_id.clone(),
            info.activity_id.clone(),
            progress_rx,
        );

        let work_future = work(ActivityContext::new(info.clone(), cancel.clone()), progress);
        let mut work_handle = tokio::spawn(
            settle(work_future)
                .in_current_span()
                .with_current_subscriber(),
        );

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Activity context has been cancelled");
                self.await_cancelled_work(work_handle).await
            }
            joined = &mut work_handle => match flatten(joined) {
                Ok(result) => ActivityOutcome::Succeeded(result),
                Err(reason) => ActivityOutcome::Failed { reason },
            },
        };

        self.report(&info, &outcome).await;

        // Stop heartbeating before returning
        let _ = stop_tx.send(());
        if let Err(e) = heartbeat.await {
            tracing::error!(error = %e, "Heartbeat loop did not shut down cleanly");
        }

        outcome
    }

    /// Give cancelled work the grace period to finish. On timeout the task is
    /// detached, not aborted.
    async fn await_cancelled_work(&self, work_handle: JoinHandle<WorkResult>) -> ActivityOutcome {
        let grace = self.options.effective_cancellation_timeout();
        match tokio::time::timeout(grace, work_handle).await {
            Ok(joined) => match flatten(joined) {
                Ok(_) => ActivityOutcome::cancelled(WORK_COMPLETED_DETAILS),
                Err(message) => ActivityOutcome::cancelled(message),
            },
            Err(_) => {
                tracing::warn!(
                    grace_ms = grace.as_millis() as u64,
                    "Work did not stop within the cancellation timeout; abandoning it"
                );
                ActivityOutcome::cancelled(CANCELLATION_TIMEOUT_DETAILS)
            }
        }
    }

    async fn report(&self, info: &ActivityInfo, outcome: &ActivityOutcome) {
        let workflow_id = info.workflow_id.as_str();
        let activity_id = info.activity_id.as_str();

        match outcome {
            ActivityOutcome::Succeeded(result) => {
                tracing::info!(result = %result, "Sending success message to workflow API");
                if let Err(e) = self
                    .client
                    .complete_successful_activity(workflow_id, activity_id, result.clone())
                    .await
                {
                    tracing::error!(error = %e, "Problem sending success message");
                }
            }
            ActivityOutcome::Failed { reason } => {
                tracing::info!(error = %reason, "Sending failure message to workflow API");
                if let Err(e) = self
                    .client
                    .complete_failed_activity(workflow_id, activity_id, reason, "")
                    .await
                {
                    tracing::error!(error = %e, "Problem sending failure message");
                }
            }
            ActivityOutcome::Cancelled { reason, details } => {
                tracing::info!(details = %details, "Sending cancellation message to workflow API");
                if let Err(e) = self
                    .client
                    .complete_cancelled_activity(workflow_id, activity_id, reason, details)
                    .await
                {
                    tracing::error!(error = %e, "Problem sending cancellation message");
                }
            }
        }
    }
}

fn activity_span(info: &ActivityInfo) -> tracing::Span {
    tracing::info_span!(
        "activity",
        workflow_id = %info.workflow_id,
        activity_id = %info.activity_id
    )
}

/// Run the work and turn its output into a [`WorkResult`]
async fn settle<Fut, T, E>(work: Fut) -> WorkResult
where
    Fut: Future<Output = Result<T, E>>,
    T: Serialize,
    E: Display,
{
    match work.await {
        Ok(output) => serde_json::to_value(&output)
            .map_err(|e| format!("Output serialization failed: {}", e)),
        Err(e) => Err(e.to_string()),
    }
}

fn flatten(joined: Result<WorkResult, JoinError>) -> WorkResult {
    match joined {
        Ok(result) => result,
        Err(join_error) if join_error.is_panic() => Err(format!(
            "Activity panicked: {}",
            panic_message(join_error.into_panic())
        )),
        Err(join_error) => Err(format!("Activity task cancelled: {}", join_error)),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_settle_serializes_output() {
        let result = settle(async { Ok::<_, String>(json!({"a": 1})) }).await;
        assert_eq!(result, Ok(json!({"a": 1})));
    }

    #[tokio::test]
    async fn test_settle_uses_error_message() {
        let result = settle(async { Err::<(), _>("Some error") }).await;
        assert_eq!(result, Err("Some error".to_string()));
    }

    #[tokio::test]
    async fn test_settle_reports_serialization_failure() {
        struct Unserializable;
        impl Serialize for Unserializable {
            fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("no way"))
            }
        }

        let result = settle(async { Ok::<_, String>(Unserializable) }).await;
        assert_eq!(result, Err("Output serialization failed: no way".to_string()));
    }

    #[tokio::test]
    async fn test_flatten_reports_panics() {
        let joined = tokio::spawn(async {
            if true {
                panic!("boom");
            }
            Ok::<Value, String>(Value::Null)
        })
        .await;
        assert_eq!(flatten(joined), Err("Activity panicked: boom".to_string()));
    }

    #[test]
    fn test_cancelled_outcome_uses_fixed_reason() {
        let outcome = ActivityOutcome::cancelled(CANCELLATION_TIMEOUT_DETAILS);
        assert!(outcome.is_cancelled());
        assert_eq!(
            outcome,
            ActivityOutcome::Cancelled {
                reason: "Cancel requested".to_string(),
                details: "Work cancelled after timeout".to_string(),
            }
        );
    }
}
