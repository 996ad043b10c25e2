//! Heartbeat manager for running activities.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::instrument::WithSubscriber;
use tracing::Instrument;
use workflow_client::SharedClient;

/// Heartbeat manager for activities
pub struct HeartbeatManager {
    client: SharedClient,
    interval: Duration,
}

impl HeartbeatManager {
    pub fn new(client: SharedClient, interval: Duration) -> Self {
        Self { client, interval }
    }

    /// Start a heartbeat task for an activity.
    ///
    /// The first heartbeat goes out one interval after start. Heartbeats
    /// continue until `stop_rx` fires or its sender is dropped. When the API
    /// answers that cancellation was requested, `cancel` is cancelled; the
    /// loop keeps heartbeating until stopped.
    pub fn start_heartbeat(
        &self,
        task_token: String,
        activity_id: String,
        cancel: CancellationToken,
        mut stop_rx: oneshot::Receiver<()>,
    ) -> JoinHandle<()> {
        let client = self.client.clone();
        let interval = self.interval;

        let heartbeat_loop = async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let details = format!("Heartbeat for activity {}", activity_id);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => {
                        tracing::debug!("Heartbeat loop stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        tracing::debug!("Sending heartbeat");
                        match client
                            .heartbeat_activity_with_token(&task_token, &activity_id, &details)
                            .await
                        {
                            Ok(heartbeat) if heartbeat.cancelled => {
                                if !cancel.is_cancelled() {
                                    tracing::info!("Cancellation requested via heartbeat");
                                }
                                cancel.cancel();
                            }
                            Ok(_) => {}
                            Err(e) => {
                                // Keep heartbeating; the next tick may succeed
                                tracing::error!(
                                    error = %e,
                                    task_token = %task_token,
                                    "Problem sending heartbeat"
                                );
                            }
                        }
                    }
                }
            }
        };

        tokio::spawn(
            heartbeat_loop
                .in_current_span()
                .with_current_subscriber(),
        )
    }
}
