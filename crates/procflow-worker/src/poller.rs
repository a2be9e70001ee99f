//! Job activation polling.
//!
//! One poller runs per registered task type. It sizes every activation
//! request by the free capacity of that task's permit pool, so the engine is
//! never asked for more jobs than the worker can hold, and it parks instead
//! of polling while the worker is saturated.

use chrono::Utc;
use procflow_core::{ActivationRequest, BackoffPolicy, Job};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

use crate::gateway::{EngineGateway, JobBatchStream};
use crate::task::TaskConfig;

/// A job admitted into the dispatch queue, carrying its capacity token.
/// Dropping the permit, wherever that happens, frees the slot exactly once.
pub(crate) struct QueuedJob {
    pub job: Job,
    pub permit: OwnedSemaphorePermit,
}

/// Worker-level polling knobs shared by all pollers.
#[derive(Debug, Clone)]
pub(crate) struct PollerSettings {
    pub worker_name: String,
    pub poll_interval: Duration,
    pub poll_retry_delay: Duration,
    pub request_timeout: Duration,
    pub reconnect_backoff: BackoffPolicy,
}

pub(crate) struct JobPoller {
    gateway: Arc<dyn EngineGateway>,
    config: Arc<TaskConfig>,
    queue: mpsc::Sender<QueuedJob>,
    permits: Arc<Semaphore>,
    settings: Arc<PollerSettings>,
    shutdown: CancellationToken,
}

impl JobPoller {
    pub(crate) fn new(
        gateway: Arc<dyn EngineGateway>,
        config: Arc<TaskConfig>,
        queue: mpsc::Sender<QueuedJob>,
        permits: Arc<Semaphore>,
        settings: Arc<PollerSettings>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            gateway,
            config,
            queue,
            permits,
            settings,
            shutdown,
        }
    }

    /// Poll until shut down. Transient activation failures back off
    /// exponentially over an unbounded retry horizon; the poller itself
    /// never gives up and never panics the worker.
    pub(crate) async fn run(self) {
        let poll_interval = self
            .config
            .poll_interval
            .unwrap_or(self.settings.poll_interval);
        let mut failures: u32 = 0;

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            let free = self
                .permits
                .available_permits()
                .min(self.config.max_concurrent_jobs);
            if free == 0 {
                trace!(
                    task_type = %self.config.task_type,
                    "all capacity in use; delaying next activation"
                );
                if self.wait(self.settings.poll_retry_delay).await {
                    break;
                }
                continue;
            }

            match self.gateway.activate_jobs(self.activation_request(free)).await {
                Ok(batches) => {
                    failures = 0;
                    if self.drain_stream(batches).await {
                        break;
                    }
                    if self.wait(poll_interval).await {
                        break;
                    }
                }
                Err(err) => {
                    let delay = self.settings.reconnect_backoff.jittered(failures);
                    failures = failures.saturating_add(1);
                    if err.is_transient() {
                        warn!(
                            task_type = %self.config.task_type,
                            error = %err,
                            delay_ms = delay.as_millis() as u64,
                            "activation failed; backing off"
                        );
                    } else {
                        error!(
                            task_type = %self.config.task_type,
                            error = %err,
                            delay_ms = delay.as_millis() as u64,
                            "activation rejected by the engine; backing off"
                        );
                    }
                    if self.wait(delay).await {
                        break;
                    }
                }
            }
        }

        debug!(task_type = %self.config.task_type, "poller stopped");
    }

    fn activation_request(&self, free: usize) -> ActivationRequest {
        ActivationRequest {
            task_type: self.config.task_type.clone(),
            worker: self.settings.worker_name.clone(),
            timeout: self.config.lease_timeout,
            max_jobs_to_activate: u32::try_from(free).unwrap_or(u32::MAX),
            fetch_variables: self.config.fetch_variables.clone(),
            request_timeout: self
                .config
                .request_timeout
                .unwrap_or(self.settings.request_timeout),
        }
    }

    /// Consume one activation stream. Returns true when the poller should
    /// stop entirely.
    async fn drain_stream(&self, mut batches: JobBatchStream) -> bool {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => return true,
                batch = batches.next() => match batch {
                    None => return false,
                    Some(Ok(jobs)) => {
                        for job in jobs {
                            if self.admit(job).await {
                                return true;
                            }
                        }
                    }
                    Some(Err(err)) => {
                        warn!(
                            task_type = %self.config.task_type,
                            error = %err,
                            "activation stream interrupted"
                        );
                        return false;
                    }
                },
            }
        }
    }

    /// Attach a capacity token and enqueue the job, applying backpressure
    /// when the pool or queue is exhausted. Returns true when the poller
    /// should stop entirely.
    async fn admit(&self, job: Job) -> bool {
        if job.lease_expired_at(Utc::now()) {
            warn!(
                job_key = %job.key,
                task_type = %job.task_type,
                "discarding job that arrived with an expired lease"
            );
            return false;
        }

        let permit = match self.permits.clone().try_acquire_owned() {
            Ok(permit) => permit,
            // The engine can return more jobs than the request asked for;
            // park on the pool rather than dropping the surplus.
            Err(_) => {
                let acquired = tokio::select! {
                    _ = self.shutdown.cancelled() => None,
                    permit = self.permits.clone().acquire_owned() => permit.ok(),
                };
                match acquired {
                    Some(permit) => permit,
                    None => return true,
                }
            }
        };

        self.queue.send(QueuedJob { job, permit }).await.is_err()
    }

    /// Sleep unless shut down first. Returns true on shutdown.
    async fn wait(&self, delay: Duration) -> bool {
        tokio::select! {
            _ = self.shutdown.cancelled() => true,
            _ = tokio::time::sleep(delay) => false,
        }
    }
}
