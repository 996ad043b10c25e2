//! Client contract for the workflow orchestration API.
//!
//! This module defines the operations offered by the workflow API: starting,
//! inspecting, cancelling and signalling workflows, and reporting activity
//! progress, heartbeats and terminal outcomes.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use workflow_core::{Activity, ApiResult, Heartbeat, PostWorkflow, Signal, Workflow};

/// Client trait for workflow operations.
///
/// Implementations must be safe for concurrent use: an activity worker calls
/// the heartbeat, progress and completion methods from separate tasks.
#[async_trait]
pub trait Client: Send + Sync {
    /// Start a new workflow and return its ID
    async fn start_workflow(&self, workflow: &PostWorkflow) -> ApiResult<String>;

    /// Fetch a workflow by ID
    async fn workflow(&self, workflow_id: &str) -> ApiResult<Workflow>;

    /// Request cancellation of a workflow
    async fn cancel_workflow(&self, workflow_id: &str) -> ApiResult<()>;

    /// Deliver a signal to a running workflow
    async fn signal_workflow(&self, workflow_id: &str, signal: &Signal) -> ApiResult<()>;

    /// Replace an activity record
    async fn update_activity(&self, workflow_id: &str, activity: &Activity)
        -> ApiResult<Activity>;

    /// Report progress of a running activity (0-100)
    async fn update_activity_percent_complete(
        &self,
        workflow_id: &str,
        activity_id: &str,
        percent_complete: i32,
    ) -> ApiResult<Activity>;

    /// Report successful completion; the API also marks progress as 100
    async fn complete_successful_activity(
        &self,
        workflow_id: &str,
        activity_id: &str,
        result: Value,
    ) -> ApiResult<Activity>;

    /// Report that the activity stopped because cancellation was requested
    async fn complete_cancelled_activity(
        &self,
        workflow_id: &str,
        activity_id: &str,
        reason: &str,
        details: &str,
    ) -> ApiResult<Activity>;

    /// Report that the activity failed
    async fn complete_failed_activity(
        &self,
        workflow_id: &str,
        activity_id: &str,
        reason: &str,
        details: &str,
    ) -> ApiResult<Activity>;

    /// Heartbeat an activity addressed by workflow and activity ID
    async fn heartbeat_activity(&self, workflow_id: &str, activity_id: &str)
        -> ApiResult<Heartbeat>;

    /// Heartbeat an activity addressed by its task token.
    ///
    /// The returned record has `cancelled` set when cancellation of the
    /// activity has been requested.
    async fn heartbeat_activity_with_token(
        &self,
        task_token: &str,
        activity_id: &str,
        details: &str,
    ) -> ApiResult<Heartbeat>;
}

macro_rules! forward_client {
    ($ptr:ident) => {
        #[async_trait]
        impl<C: Client + ?Sized> Client for $ptr<C> {
            async fn start_workflow(&self, workflow: &PostWorkflow) -> ApiResult<String> {
                (**self).start_workflow(workflow).await
            }

            async fn workflow(&self, workflow_id: &str) -> ApiResult<Workflow> {
                (**self).workflow(workflow_id).await
            }

            async fn cancel_workflow(&self, workflow_id: &str) -> ApiResult<()> {
                (**self).cancel_workflow(workflow_id).await
            }

            async fn signal_workflow(&self, workflow_id: &str, signal: &Signal) -> ApiResult<()> {
                (**self).signal_workflow(workflow_id, signal).await
            }

            async fn update_activity(
                &self,
                workflow_id: &str,
                activity: &Activity,
            ) -> ApiResult<Activity> {
                (**self).update_activity(workflow_id, activity).await
            }

            async fn update_activity_percent_complete(
                &self,
                workflow_id: &str,
                activity_id: &str,
                percent_complete: i32,
            ) -> ApiResult<Activity> {
                (**self)
                    .update_activity_percent_complete(workflow_id, activity_id, percent_complete)
                    .await
            }

            async fn complete_successful_activity(
                &self,
                workflow_id: &str,
                activity_id: &str,
                result: Value,
            ) -> ApiResult<Activity> {
                (**self)
                    .complete_successful_activity(workflow_id, activity_id, result)
                    .await
            }

            async fn complete_cancelled_activity(
                &self,
                workflow_id: &str,
                activity_id: &str,
                reason: &str,
                details: &str,
            ) -> ApiResult<Activity> {
                (**self)
                    .complete_cancelled_activity(workflow_id, activity_id, reason, details)
                    .await
            }

            async fn complete_failed_activity(
                &self,
                workflow_id: &str,
                activity_id: &str,
                reason: &str,
                details: &str,
            ) -> ApiResult<Activity> {
                (**self)
                    .complete_failed_activity(workflow_id, activity_id, reason, details)
                    .await
            }

            async fn heartbeat_activity(
                &self,
                workflow_id: &str,
                activity_id: &str,
            ) -> ApiResult<Heartbeat> {
                (**self).heartbeat_activity(workflow_id, activity_id).await
            }

            async fn heartbeat_activity_with_token(
                &self,
                task_token: &str,
                activity_id: &str,
                details: &str,
            ) -> ApiResult<Heartbeat> {
                (**self)
                    .heartbeat_activity_with_token(task_token, activity_id, details)
                    .await
            }
        }
    };
}

forward_client!(Arc);
forward_client!(Box);

/// Shared handle to a client, as held by workers
pub type SharedClient = Arc<dyn Client>;
