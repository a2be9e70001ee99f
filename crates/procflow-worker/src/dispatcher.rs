//! Bounded-concurrency job dispatch.
//!
//! The dispatcher pulls admitted jobs off the queue and spawns one lifecycle
//! task per job. Concurrency is already bounded by the permit each queued
//! job carries; the dispatcher's job is to keep the loop itself independent
//! of any single job's fate.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::gateway::EngineGateway;
use crate::lifecycle::{run_job, LifecycleSettings};
use crate::poller::QueuedJob;
use crate::task::JobHandler;

pub(crate) struct JobDispatcher {
    task_type: String,
    queue: mpsc::Receiver<QueuedJob>,
    handler: Arc<dyn JobHandler>,
    gateway: Arc<dyn EngineGateway>,
    settings: Arc<LifecycleSettings>,
    shutdown: CancellationToken,
}

impl JobDispatcher {
    pub(crate) fn new(
        task_type: String,
        queue: mpsc::Receiver<QueuedJob>,
        handler: Arc<dyn JobHandler>,
        gateway: Arc<dyn EngineGateway>,
        settings: Arc<LifecycleSettings>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            task_type,
            queue,
            handler,
            gateway,
            settings,
            shutdown,
        }
    }

    /// Dispatch until shut down, then drain jobs that already reached a
    /// lifecycle task. Jobs still queued at shutdown are dropped; their
    /// leases lapse server-side and the engine re-activates them.
    pub(crate) async fn run(mut self) {
        let mut running: JoinSet<()> = JoinSet::new();

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                queued = self.queue.recv() => match queued {
                    None => break,
                    Some(QueuedJob { job, permit }) => {
                        running.spawn(run_job(
                            job,
                            permit,
                            self.handler.clone(),
                            self.gateway.clone(),
                            self.settings.clone(),
                        ));
                    }
                },
                Some(result) = running.join_next(), if !running.is_empty() => {
                    if let Err(fault) = result {
                        error!(
                            task_type = %self.task_type,
                            error = %fault,
                            "job lifecycle task failed"
                        );
                    }
                }
            }
        }

        self.queue.close();
        while let Some(result) = running.join_next().await {
            if let Err(fault) = result {
                error!(
                    task_type = %self.task_type,
                    error = %fault,
                    "job lifecycle task failed"
                );
            }
        }
        debug!(task_type = %self.task_type, "dispatcher stopped");
    }
}
