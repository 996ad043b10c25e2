//! Worker configuration.

use std::time::Duration;

/// Heartbeat period used when none is configured
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

/// Grace period after cancellation used when none is configured
pub const DEFAULT_CANCELLATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Worker options for configuration.
///
/// A zero duration counts as unset and falls back to the default.
#[derive(Clone)]
pub struct WorkerOptions {
    /// Period between heartbeats sent to the workflow API
    pub heartbeat_interval: Duration,
    /// Time to wait for the work to stop after cancellation before reporting
    /// the activity as cancelled anyway
    pub cancellation_timeout: Duration,
    /// Where the worker's log events go. `None` uses whatever dispatcher is
    /// current for the caller, which discards everything unless the
    /// application installed a subscriber.
    pub log_dispatch: Option<tracing::Dispatch>,
}

impl WorkerOptions {
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn with_cancellation_timeout(mut self, timeout: Duration) -> Self {
        self.cancellation_timeout = timeout;
        self
    }

    /// Route this worker's log events to `dispatch` instead of the caller's
    /// default subscriber
    pub fn with_log_dispatch(mut self, dispatch: tracing::Dispatch) -> Self {
        self.log_dispatch = Some(dispatch);
        self
    }

    /// Heartbeat interval actually used
    pub fn effective_heartbeat_interval(&self) -> Duration {
        non_zero_or(self.heartbeat_interval, DEFAULT_HEARTBEAT_INTERVAL)
    }

    /// Cancellation grace period actually used
    pub fn effective_cancellation_timeout(&self) -> Duration {
        non_zero_or(self.cancellation_timeout, DEFAULT_CANCELLATION_TIMEOUT)
    }
}

fn non_zero_or(value: Duration, default: Duration) -> Duration {
    if value.is_zero() {
        default
    } else {
        value
    }
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            cancellation_timeout: DEFAULT_CANCELLATION_TIMEOUT,
            log_dispatch: None,
        }
    }
}

impl std::fmt::Debug for WorkerOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerOptions")
            .field("heartbeat_interval", &self.heartbeat_interval)
            .field("cancellation_timeout", &self.cancellation_timeout)
            .field("log_dispatch", &self.log_dispatch.is_some())
            .finish()
    }
}
