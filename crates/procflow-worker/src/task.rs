//! Handler registration: traits, per-task configuration and routers.

use async_trait::async_trait;
use procflow_core::{Job, JobOutcome};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ConfigError;
use crate::lifecycle::JobContext;

/// Handler invoked once per activated job.
///
/// The handler receives its own copy of the job and a context for lease
/// extension. Whatever it returns (or however it panics) is absorbed at the
/// dispatch boundary; a handler can never take down the worker.
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    async fn handle(&self, job: Job, ctx: JobContext) -> JobOutcome;
}

/// Adapter turning an async closure into a [`JobHandler`].
pub struct HandlerFn<F>(F);

/// Wrap an async closure as a [`JobHandler`].
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(Job, JobContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = JobOutcome> + Send + 'static,
{
    HandlerFn(f)
}

#[async_trait]
impl<F, Fut> JobHandler for HandlerFn<F>
where
    F: Fn(Job, JobContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = JobOutcome> + Send + 'static,
{
    async fn handle(&self, job: Job, ctx: JobContext) -> JobOutcome {
        (self.0)(job, ctx).await
    }
}

/// Per-task-type registration settings.
#[derive(Debug, Clone)]
pub struct TaskConfig {
    /// Task type this registration serves.
    pub task_type: String,

    /// Upper bound on concurrently executing jobs of this type.
    pub max_concurrent_jobs: usize,

    /// Lease duration requested per activated job.
    pub lease_timeout: Duration,

    /// Override of the worker-level activation request timeout.
    pub request_timeout: Option<Duration>,

    /// Override of the worker-level poll interval.
    pub poll_interval: Option<Duration>,

    /// Variables to fetch per job; empty fetches all.
    pub fetch_variables: Vec<String>,
}

impl TaskConfig {
    /// Create a registration with default limits.
    pub fn new(task_type: impl Into<String>) -> Self {
        Self {
            task_type: task_type.into(),
            max_concurrent_jobs: 8,
            lease_timeout: Duration::from_secs(10),
            request_timeout: None,
            poll_interval: None,
            fetch_variables: Vec::new(),
        }
    }

    /// Set the concurrency limit for this task type.
    pub fn with_max_concurrent_jobs(mut self, limit: usize) -> Self {
        self.max_concurrent_jobs = limit;
        self
    }

    /// Set the lease duration requested per job.
    pub fn with_lease_timeout(mut self, timeout: Duration) -> Self {
        self.lease_timeout = timeout;
        self
    }

    /// Override the activation request timeout for this task type.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Override the poll interval for this task type.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Restrict which variables the engine returns per job.
    pub fn with_fetch_variables(mut self, names: Vec<String>) -> Self {
        self.fetch_variables = names;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.task_type.is_empty() {
            return Err(ConfigError::EmptyTaskType);
        }
        if self.max_concurrent_jobs == 0 {
            return Err(ConfigError::ZeroConcurrency(self.task_type.clone()));
        }
        if self.lease_timeout.is_zero() {
            return Err(ConfigError::ZeroLeaseTimeout(self.task_type.clone()));
        }
        Ok(())
    }
}

/// One validated registration: configuration plus handler.
pub(crate) struct TaskRegistration {
    pub config: TaskConfig,
    pub handler: Arc<dyn JobHandler>,
}

/// A standalone collection of registrations that can be merged into a
/// worker builder, so handler modules register themselves without seeing
/// the builder.
#[derive(Default)]
pub struct TaskRouter {
    registrations: Vec<TaskRegistration>,
}

impl TaskRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under default task settings.
    pub fn job_type(self, task_type: impl Into<String>, handler: impl JobHandler) -> Self {
        self.job_type_with(TaskConfig::new(task_type), handler)
    }

    /// Register a handler with explicit task settings.
    pub fn job_type_with(mut self, config: TaskConfig, handler: impl JobHandler) -> Self {
        self.registrations.push(TaskRegistration {
            config,
            handler: Arc::new(handler),
        });
        self
    }

    pub(crate) fn into_registrations(self) -> Vec<TaskRegistration> {
        self.registrations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TaskConfig::new("ship-order");
        assert_eq!(config.task_type, "ship-order");
        assert_eq!(config.max_concurrent_jobs, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_task_type() {
        assert_eq!(
            TaskConfig::new("").validate(),
            Err(ConfigError::EmptyTaskType)
        );
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let err = TaskConfig::new("ship-order")
            .with_max_concurrent_jobs(0)
            .validate()
            .unwrap_err();
        assert_eq!(err, ConfigError::ZeroConcurrency("ship-order".to_owned()));
    }

    #[test]
    fn test_rejects_zero_lease_timeout() {
        let err = TaskConfig::new("ship-order")
            .with_lease_timeout(Duration::ZERO)
            .validate()
            .unwrap_err();
        assert_eq!(err, ConfigError::ZeroLeaseTimeout("ship-order".to_owned()));
    }

    #[test]
    fn test_router_collects_registrations() {
        let router = TaskRouter::new()
            .job_type("a", handler_fn(|_, _| async { JobOutcome::complete() }))
            .job_type("b", handler_fn(|_, _| async { JobOutcome::complete() }));
        assert_eq!(router.into_registrations().len(), 2);
    }
}
