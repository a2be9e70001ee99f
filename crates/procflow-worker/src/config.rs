//! Worker configuration.

use procflow_core::BackoffPolicy;
use std::time::Duration;
use uuid::Uuid;

/// Worker-level configuration shared by all registered task types.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Name the worker identifies itself with in activation requests.
    pub worker_name: String,

    /// Delay between activation polls when the last poll succeeded.
    pub poll_interval: Duration,

    /// Delay before polling again while all capacity is in use.
    pub poll_retry_delay: Duration,

    /// How long the engine may hold an activation request open waiting for
    /// jobs. Task registrations may override this per task type.
    pub request_timeout: Duration,

    /// Backoff applied between activation attempts after transient gateway
    /// failures.
    pub reconnect_backoff: BackoffPolicy,

    /// Local retries of a failing terminal report before giving up on the
    /// job. The bound is deployment policy, so it is configuration rather
    /// than a constant.
    pub report_retry_limit: u32,

    /// Backoff between terminal report retries.
    pub report_retry_backoff: BackoffPolicy,

    /// Backoff hint sent to the engine when a handler fault is converted to
    /// a failure without an explicit hint.
    pub failure_backoff: BackoffPolicy,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        let worker_name = std::env::var("HOSTNAME")
            .unwrap_or_else(|_| format!("worker-{}", Uuid::new_v4()));

        Self {
            worker_name,
            poll_interval: Duration::from_millis(100),
            poll_retry_delay: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            reconnect_backoff: BackoffPolicy::new(
                Duration::from_millis(500),
                Duration::from_secs(30),
            ),
            report_retry_limit: 3,
            report_retry_backoff: BackoffPolicy::new(
                Duration::from_millis(100),
                Duration::from_secs(2),
            ),
            failure_backoff: BackoffPolicy::new(Duration::from_secs(1), Duration::from_secs(30)),
        }
    }
}

impl WorkerConfig {
    /// Override the worker name.
    pub fn with_worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }
}
