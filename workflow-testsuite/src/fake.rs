//! Recording fake of the workflow API client.
//!
//! [`FakeClient`] stands in for the workflow API in tests. Every operation
//! records its arguments, and responses can be scripted per operation. By
//! default every call succeeds with a record built from its arguments.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;
use workflow_client::Client;
use workflow_core::{
    Activity, ApiResult, Heartbeat, PostWorkflow, Signal, Workflow, WorkflowStatus,
};

/// Scripted response, given the zero-based index of the call
type Stub<T> = Arc<dyn Fn(usize) -> ApiResult<T> + Send + Sync>;

/// Call log and response script for one client operation
pub struct Recorded<A, T> {
    calls: Mutex<Vec<A>>,
    stub: Mutex<Option<Stub<T>>>,
    notify: Notify,
}

impl<A: Clone, T> Recorded<A, T> {
    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Arguments of call `index`.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `index + 1` calls were made.
    pub fn args_for_call(&self, index: usize) -> A {
        let calls = self.calls.lock();
        match calls.get(index) {
            Some(args) => args.clone(),
            None => panic!(
                "args_for_call({}) requested but only {} call(s) recorded",
                index,
                calls.len()
            ),
        }
    }

    /// Arguments of every call, in order
    pub fn calls(&self) -> Vec<A> {
        self.calls.lock().clone()
    }

    /// Answer every call with `value`
    pub fn returns(&self, value: T)
    where
        T: Clone + Send + Sync + 'static,
    {
        self.stub(move |_| Ok(value.clone()));
    }

    /// Answer calls with `f(call_index)`
    pub fn stub<F>(&self, f: F)
    where
        F: Fn(usize) -> ApiResult<T> + Send + Sync + 'static,
    {
        *self.stub.lock() = Some(Arc::new(f));
    }

    /// Wait until at least `count` calls were recorded. Returns `false` if
    /// `timeout` elapsed first.
    pub async fn wait_for_calls(&self, count: usize, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let notified = self.notify.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();
                if self.call_count() >= count {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }

    /// Record a call and produce its scripted response, if any
    fn record(&self, args: A) -> Option<ApiResult<T>> {
        let index = {
            let mut calls = self.calls.lock();
            calls.push(args);
            calls.len() - 1
        };
        self.notify.notify_waiters();
        let stub = self.stub.lock().clone();
        stub.map(|f| f(index))
    }
}

impl<A, T> Default for Recorded<A, T> {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            stub: Mutex::new(None),
            notify: Notify::new(),
        }
    }
}

/// In-memory [`Client`] that records calls.
///
/// Fields are named after the operation they record, e.g.
/// `fake.complete_failed_activity.call_count()`.
#[derive(Default)]
pub struct FakeClient {
    pub start_workflow: Recorded<PostWorkflow, String>,
    pub workflow: Recorded<String, Workflow>,
    pub cancel_workflow: Recorded<String, ()>,
    pub signal_workflow: Recorded<(String, Signal), ()>,
    pub update_activity: Recorded<(String, Activity), Activity>,
    /// (workflow_id, activity_id, percent_complete)
    pub update_activity_percent_complete: Recorded<(String, String, i32), Activity>,
    /// (workflow_id, activity_id, result)
    pub complete_successful_activity: Recorded<(String, String, Value), Activity>,
    /// (workflow_id, activity_id, reason, details)
    pub complete_cancelled_activity: Recorded<(String, String, String, String), Activity>,
    /// (workflow_id, activity_id, reason, details)
    pub complete_failed_activity: Recorded<(String, String, String, String), Activity>,
    pub heartbeat_activity: Recorded<(String, String), Heartbeat>,
    /// (task_token, activity_id, details)
    pub heartbeat_activity_with_token: Recorded<(String, String, String), Heartbeat>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of terminal reports (success, failure, cancellation)
    pub fn terminal_report_count(&self) -> usize {
        self.complete_successful_activity.call_count()
            + self.complete_failed_activity.call_count()
            + self.complete_cancelled_activity.call_count()
    }

    /// Percent-complete values forwarded so far, in order
    pub fn percent_updates(&self) -> Vec<i32> {
        self.update_activity_percent_complete
            .calls()
            .into_iter()
            .map(|(_, _, percent)| percent)
            .collect()
    }
}

#[async_trait]
impl Client for FakeClient {
    async fn start_workflow(&self, workflow: &PostWorkflow) -> ApiResult<String> {
        let response = self.start_workflow.record(workflow.clone());
        let count = self.start_workflow.call_count();
        response.unwrap_or_else(|| Ok(format!("workflow-{}", count)))
    }

    async fn workflow(&self, workflow_id: &str) -> ApiResult<Workflow> {
        self.workflow
            .record(workflow_id.to_string())
            .unwrap_or_else(|| {
                Ok(Workflow {
                    id: workflow_id.to_string(),
                    workflow_type: String::new(),
                    entity_id: String::new(),
                    status: WorkflowStatus::Running,
                    activities: Vec::new(),
                })
            })
    }

    async fn cancel_workflow(&self, workflow_id: &str) -> ApiResult<()> {
        self.cancel_workflow
            .record(workflow_id.to_string())
            .unwrap_or(Ok(()))
    }

    async fn signal_workflow(&self, workflow_id: &str, signal: &Signal) -> ApiResult<()> {
        self.signal_workflow
            .record((workflow_id.to_string(), signal.clone()))
            .unwrap_or(Ok(()))
    }

    async fn update_activity(
        &self,
        workflow_id: &str,
        activity: &Activity,
    ) -> ApiResult<Activity> {
        self.update_activity
            .record((workflow_id.to_string(), activity.clone()))
            .unwrap_or_else(|| Ok(activity.clone()))
    }

    async fn update_activity_percent_complete(
        &self,
        workflow_id: &str,
        activity_id: &str,
        percent_complete: i32,
    ) -> ApiResult<Activity> {
        self.update_activity_percent_complete
            .record((
                workflow_id.to_string(),
                activity_id.to_string(),
                percent_complete,
            ))
            .unwrap_or_else(|| Ok(Activity::running(activity_id, percent_complete)))
    }

    async fn complete_successful_activity(
        &self,
        workflow_id: &str,
        activity_id: &str,
        result: Value,
    ) -> ApiResult<Activity> {
        self.complete_successful_activity
            .record((
                workflow_id.to_string(),
                activity_id.to_string(),
                result.clone(),
            ))
            .unwrap_or_else(|| Ok(Activity::completed(activity_id, result)))
    }

    async fn complete_cancelled_activity(
        &self,
        workflow_id: &str,
        activity_id: &str,
        reason: &str,
        details: &str,
    ) -> ApiResult<Activity> {
        self.complete_cancelled_activity
            .record((
                workflow_id.to_string(),
                activity_id.to_string(),
                reason.to_string(),
                details.to_string(),
            ))
            .unwrap_or_else(|| Ok(Activity::cancelled(activity_id, reason, details)))
    }

    async fn complete_failed_activity(
        &self,
        workflow_id: &str,
        activity_id: &str,
        reason: &str,
        details: &str,
    ) -> ApiResult<Activity> {
        self.complete_failed_activity
            .record((
                workflow_id.to_string(),
                activity_id.to_string(),
                reason.to_string(),
                details.to_string(),
            ))
            .unwrap_or_else(|| Ok(Activity::failed(activity_id, reason, details)))
    }

    async fn heartbeat_activity(
        &self,
        workflow_id: &str,
        activity_id: &str,
    ) -> ApiResult<Heartbeat> {
        self.heartbeat_activity
            .record((workflow_id.to_string(), activity_id.to_string()))
            .unwrap_or_else(|| Ok(Heartbeat::new(activity_id)))
    }

    async fn heartbeat_activity_with_token(
        &self,
        task_token: &str,
        activity_id: &str,
        details: &str,
    ) -> ApiResult<Heartbeat> {
        self.heartbeat_activity_with_token
            .record((
                task_token.to_string(),
                activity_id.to_string(),
                details.to_string(),
            ))
            .unwrap_or_else(|| Ok(Heartbeat::with_token(task_token, activity_id, details)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use workflow_core::WorkflowApiError;

    #[tokio::test]
    async fn test_records_arguments_in_order() {
        let fake = FakeClient::new();
        fake.update_activity_percent_complete("wf", "act", 30).await.unwrap();
        fake.update_activity_percent_complete("wf", "act", 60).await.unwrap();

        assert_eq!(fake.update_activity_percent_complete.call_count(), 2);
        assert_eq!(
            fake.update_activity_percent_complete.args_for_call(0),
            ("wf".to_string(), "act".to_string(), 30)
        );
        assert_eq!(fake.percent_updates(), vec![30, 60]);
    }

    #[tokio::test]
    async fn test_default_heartbeat_is_not_cancelled() {
        let fake = FakeClient::new();
        let hb = fake
            .heartbeat_activity_with_token("token", "act", "details")
            .await
            .unwrap();
        assert!(!hb.cancelled);
        assert_eq!(hb.task_token.as_deref(), Some("token"));
    }

    #[tokio::test]
    async fn test_scripted_responses() {
        let fake = FakeClient::new();
        fake.heartbeat_activity_with_token
            .returns(Heartbeat::cancel_requested("act"));
        fake.complete_failed_activity
            .stub(|_| Err(WorkflowApiError::transport("connection refused")));

        let hb = fake
            .heartbeat_activity_with_token("token", "act", "")
            .await
            .unwrap();
        assert!(hb.cancelled);

        let err = fake
            .complete_failed_activity("wf", "act", "reason", "")
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowApiError::Transport(_)));
        assert_eq!(fake.terminal_report_count(), 1);
    }

    #[tokio::test]
    async fn test_stub_sees_call_index() {
        let fake = FakeClient::new();
        fake.start_workflow.stub(|i| Ok(format!("wf-{}", i)));
        let post = PostWorkflow::new("type", "entity");
        assert_eq!(fake.start_workflow(&post).await.unwrap(), "wf-0");
        assert_eq!(fake.start_workflow(&post).await.unwrap(), "wf-1");
    }

    #[tokio::test]
    async fn test_wait_for_calls() {
        let fake = Arc::new(FakeClient::new());
        assert!(
            !fake
                .heartbeat_activity
                .wait_for_calls(1, Duration::from_millis(20))
                .await
        );

        let caller = fake.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            caller.heartbeat_activity("wf", "act").await.unwrap();
        });

        assert!(
            fake.heartbeat_activity
                .wait_for_calls(1, Duration::from_secs(1))
                .await
        );
    }
}
