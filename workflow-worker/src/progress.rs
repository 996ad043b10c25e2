//! Forwards percent-complete updates from a unit of work to the workflow API.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::instrument::WithSubscriber;
use tracing::Instrument;
use workflow_client::SharedClient;

/// Last-forwarded marker before any progress has been sent
const NO_PROGRESS: i32 = -1;

/// Spawn the forwarder. It runs until every sender of `progress_rx` is
/// dropped, and only calls the API when a value differs from the one
/// forwarded just before it.
pub(crate) fn spawn_progress_forwarder(
    client: SharedClient,
    workflow_id: String,
    activity_id: String,
    mut progress_rx: mpsc::Receiver<i32>,
) -> JoinHandle<()> {
    let forwarder = async move {
        let mut last_percent_complete = NO_PROGRESS;
        while let Some(percent_complete) = progress_rx.recv().await {
            if percent_complete == last_percent_complete {
                continue;
            }
            if let Err(e) = client
                .update_activity_percent_complete(&workflow_id, &activity_id, percent_complete)
                .await
            {
                tracing::error!(
                    error = %e,
                    percent_complete,
                    "Problem updating percent complete"
                );
            }
            last_percent_complete = percent_complete;
        }
    };

    tokio::spawn(forwarder.in_current_span().with_current_subscriber())
}
