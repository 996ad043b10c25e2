//! Activity context handed to a unit of work.
//!
//! The context identifies the activity being executed and carries the
//! cancellation signal the work is expected to observe.

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Activity information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityInfo {
    pub workflow_id: String,
    pub activity_id: String,
    /// Opaque credential scoping heartbeats to this activity execution
    pub task_token: String,
}

impl ActivityInfo {
    pub fn new(
        workflow_id: impl Into<String>,
        activity_id: impl Into<String>,
        task_token: impl Into<String>,
    ) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            activity_id: activity_id.into(),
            task_token: task_token.into(),
        }
    }
}

/// Activity context for executing activity logic.
///
/// Work functions must watch [`ActivityContext::cancelled`] (or poll
/// [`ActivityContext::is_cancelled`]) and return promptly once it fires. The
/// worker only waits a bounded grace period after cancellation.
#[derive(Debug, Clone)]
pub struct ActivityContext {
    info: ActivityInfo,
    cancel: CancellationToken,
}

impl ActivityContext {
    pub fn new(info: ActivityInfo, cancel: CancellationToken) -> Self {
        Self { info, cancel }
    }

    /// Get activity information
    pub fn info(&self) -> &ActivityInfo {
        &self.info
    }

    pub fn workflow_id(&self) -> &str {
        &self.info.workflow_id
    }

    pub fn activity_id(&self) -> &str {
        &self.info.activity_id
    }

    /// Check if the activity has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once cancellation has been requested
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    /// Token for handing cancellation down to nested operations
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn context() -> (ActivityContext, CancellationToken) {
        let token = CancellationToken::new();
        let ctx = ActivityContext::new(
            ActivityInfo::new("workflow id", "activity id", "token"),
            token.clone(),
        );
        (ctx, token)
    }

    #[test]
    fn test_info_accessors() {
        let (ctx, _) = context();
        assert_eq!(ctx.workflow_id(), "workflow id");
        assert_eq!(ctx.activity_id(), "activity id");
        assert_eq!(ctx.info().task_token, "token");
    }

    #[tokio::test]
    async fn test_cancellation_is_visible_to_every_clone() {
        let (ctx, token) = context();
        let clone = ctx.clone();
        assert!(!ctx.is_cancelled());

        token.cancel();
        // Cancelling twice is a no-op
        token.cancel();

        assert!(ctx.is_cancelled());
        tokio::time::timeout(Duration::from_millis(100), clone.cancelled())
            .await
            .expect("cancelled future should resolve");
    }
}
