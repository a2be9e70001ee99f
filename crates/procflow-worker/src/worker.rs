//! Worker assembly: registration, validation and orchestration.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::WorkerConfig;
use crate::dispatcher::JobDispatcher;
use crate::error::ConfigError;
use crate::gateway::EngineGateway;
use crate::lifecycle::LifecycleSettings;
use crate::poller::{JobPoller, PollerSettings};
use crate::task::{JobHandler, TaskConfig, TaskRegistration, TaskRouter};

/// Builder collecting configuration and handler registrations.
///
/// All validation happens in [`build`](Self::build): invalid registrations
/// are the one class of error that is fatal, because a worker that cannot
/// represent its own registrations has nothing meaningful to do.
pub struct JobWorkerBuilder {
    config: WorkerConfig,
    gateway: Option<Arc<dyn EngineGateway>>,
    registrations: Vec<TaskRegistration>,
}

impl Default for JobWorkerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl JobWorkerBuilder {
    pub fn new() -> Self {
        Self {
            config: WorkerConfig::default(),
            gateway: None,
            registrations: Vec::new(),
        }
    }

    /// Replace the worker-level configuration.
    pub fn with_config(mut self, config: WorkerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the engine gateway all components talk through.
    pub fn gateway(mut self, gateway: Arc<dyn EngineGateway>) -> Self {
        self.gateway = Some(gateway);
        self
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

    /// Merge all registrations collected on a router.
    pub fn include_router(mut self, router: TaskRouter) -> Self {
        self.registrations.extend(router.into_registrations());
        self
    }

    /// Validate every registration and assemble the worker.
    pub fn build(self) -> Result<JobWorker, ConfigError> {
        let gateway = self.gateway.ok_or(ConfigError::NoGateway)?;
        if self.registrations.is_empty() {
            return Err(ConfigError::NoTasks);
        }

        let mut seen = HashSet::new();
        for registration in &self.registrations {
            registration.config.validate()?;
            if !seen.insert(registration.config.task_type.clone()) {
                return Err(ConfigError::DuplicateTaskType(
                    registration.config.task_type.clone(),
                ));
            }
        }

        Ok(JobWorker {
            config: self.config,
            gateway,
            registrations: self.registrations,
            shutdown: CancellationToken::new(),
        })
    }
}

/// A running worker is one poller/dispatcher pair per registered task type,
/// all sharing the gateway and a shutdown token.
pub struct JobWorker {
    config: WorkerConfig,
    gateway: Arc<dyn EngineGateway>,
    registrations: Vec<TaskRegistration>,
    shutdown: CancellationToken,
}

/// Handle for requesting a graceful shutdown from outside [`JobWorker::run`].
#[derive(Clone)]
pub struct WorkerHandle {
    shutdown: CancellationToken,
}

impl WorkerHandle {
    /// Stop polling for new jobs and let in-flight jobs settle.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl JobWorker {
    /// Obtain a shutdown handle. May be called any number of times.
    pub fn handle(&self) -> WorkerHandle {
        WorkerHandle {
            shutdown: self.shutdown.clone(),
        }
    }

    /// Run all pollers and dispatchers until shutdown, then drain in-flight
    /// jobs to their terminal outcome.
    pub async fn run(self) {
        let poller_settings = Arc::new(PollerSettings {
            worker_name: self.config.worker_name.clone(),
            poll_interval: self.config.poll_interval,
            poll_retry_delay: self.config.poll_retry_delay,
            request_timeout: self.config.request_timeout,
            reconnect_backoff: self.config.reconnect_backoff.clone(),
        });
        let lifecycle_settings = Arc::new(LifecycleSettings {
            report_retry_limit: self.config.report_retry_limit,
            report_backoff: self.config.report_retry_backoff.clone(),
            failure_backoff: self.config.failure_backoff.clone(),
        });

        info!(
            worker = %self.config.worker_name,
            task_types = self.registrations.len(),
            "worker started"
        );

        let mut components = JoinSet::new();
        for TaskRegistration { config, handler } in self.registrations {
            let config = Arc::new(config);
            let permits = Arc::new(Semaphore::new(config.max_concurrent_jobs));
            let (queue_tx, queue_rx) = mpsc::channel(config.max_concurrent_jobs);

            let poller = JobPoller::new(
                self.gateway.clone(),
                config.clone(),
                queue_tx,
                permits,
                poller_settings.clone(),
                self.shutdown.clone(),
            );
            let dispatcher = JobDispatcher::new(
                config.task_type.clone(),
                queue_rx,
                handler,
                self.gateway.clone(),
                lifecycle_settings.clone(),
                self.shutdown.clone(),
            );

            components.spawn(poller.run());
            components.spawn(dispatcher.run());
        }

        while let Some(result) = components.join_next().await {
            if let Err(fault) = result {
                error!(error = %fault, "worker component failed");
            }
        }

        info!(worker = %self.config.worker_name, "worker stopped");
    }
}
