//! Record types exchanged with the workflow API.
//!
//! These are plain data carriers. How they are put on the wire is up to the
//! endpoint implementation; the serde derives use camelCase field names.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body for starting a new workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostWorkflow {
    pub workflow_type: String,
    pub entity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
}

impl PostWorkflow {
    pub fn new(workflow_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            workflow_type: workflow_type.into(),
            entity_id: entity_id.into(),
            input: None,
        }
    }

    pub fn with_input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }
}

/// Lifecycle state of a workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub enum WorkflowStatus {
    #[default]
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// A workflow as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: String,
    pub workflow_type: String,
    pub entity_id: String,
    #[serde(default)]
    pub status: WorkflowStatus,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

/// External signal delivered to a running workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Signal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Status of a single activity within a workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub enum ActivityStatus {
    #[default]
    Scheduled,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl ActivityStatus {
    /// Completed, failed and cancelled activities never change again
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Reason and details attached to a failed or cancelled activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityFailure {
    pub reason: String,
    #[serde(default)]
    pub details: String,
}

/// An activity record.
///
/// The constructors mirror the records sent for each kind of report, so an
/// endpoint can implement every report through a single update call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    #[serde(default)]
    pub status: ActivityStatus,
    #[serde(default)]
    pub percent_complete: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ActivityFailure>,
}

impl Activity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: ActivityStatus::default(),
            percent_complete: 0,
            result: None,
            error: None,
        }
    }

    /// Progress update for a running activity
    pub fn running(id: impl Into<String>, percent_complete: i32) -> Self {
        Self {
            status: ActivityStatus::Running,
            percent_complete,
            ..Self::new(id)
        }
    }

    /// Successful completion; progress is pinned to 100
    pub fn completed(id: impl Into<String>, result: Value) -> Self {
        Self {
            status: ActivityStatus::Completed,
            percent_complete: 100,
            result: Some(result),
            ..Self::new(id)
        }
    }

    pub fn failed(
        id: impl Into<String>,
        reason: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            status: ActivityStatus::Failed,
            error: Some(ActivityFailure {
                reason: reason.into(),
                details: details.into(),
            }),
            ..Self::new(id)
        }
    }

    pub fn cancelled(
        id: impl Into<String>,
        reason: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            status: ActivityStatus::Cancelled,
            error: Some(ActivityFailure {
                reason: reason.into(),
                details: details.into(),
            }),
            ..Self::new(id)
        }
    }
}

/// Liveness record. The API sets `cancelled` when cancellation of the
/// activity has been requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Heartbeat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_token: Option<String>,
    pub activity_id: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub cancelled: bool,
}

impl Heartbeat {
    pub fn new(activity_id: impl Into<String>) -> Self {
        Self {
            activity_id: activity_id.into(),
            ..Self::default()
        }
    }

    pub fn with_token(
        task_token: impl Into<String>,
        activity_id: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            task_token: Some(task_token.into()),
            activity_id: activity_id.into(),
            details: details.into(),
            cancelled: false,
        }
    }

    /// Heartbeat response asking the activity to stop
    pub fn cancel_requested(activity_id: impl Into<String>) -> Self {
        Self {
            cancelled: true,
            ..Self::new(activity_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_completed_activity_is_full_progress() {
        let activity = Activity::completed("act-1", json!({"answer": 42}));
        assert_eq!(activity.status, ActivityStatus::Completed);
        assert_eq!(activity.percent_complete, 100);
        assert_eq!(activity.result, Some(json!({"answer": 42})));
        assert!(activity.error.is_none());
    }

    #[test]
    fn test_cancelled_activity_carries_reason_and_details() {
        let activity = Activity::cancelled("act-1", "Cancel requested", "stopped early");
        assert_eq!(activity.status, ActivityStatus::Cancelled);
        let error = activity.error.expect("cancelled activity has error");
        assert_eq!(error.reason, "Cancel requested");
        assert_eq!(error.details, "stopped early");
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!ActivityStatus::Scheduled.is_terminal());
        assert!(!ActivityStatus::Running.is_terminal());
        assert!(ActivityStatus::Completed.is_terminal());
        assert!(ActivityStatus::Failed.is_terminal());
        assert!(ActivityStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_activity_uses_camel_case_fields() {
        let value = serde_json::to_value(Activity::running("act-1", 30)).unwrap();
        assert_eq!(
            value,
            json!({"id": "act-1", "status": "Running", "percentComplete": 30})
        );
    }

    #[test]
    fn test_heartbeat_defaults_to_not_cancelled() {
        let hb: Heartbeat = serde_json::from_value(json!({"activityId": "act-1"})).unwrap();
        assert!(!hb.cancelled);
        assert!(hb.task_token.is_none());
    }
}
