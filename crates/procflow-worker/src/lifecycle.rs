//! Per-job lifecycle: state machine, lease watchdog and terminal reporting.
//!
//! Exactly one of two things happens to every dispatched job: a single
//! terminal report (complete, fail or throw-error) is delivered to the
//! engine, or the job is explicitly abandoned because its lease expired.
//! Never both, and never two terminal reports for the same key.

use procflow_core::{BackoffPolicy, Job, JobKey, JobOutcome, LeaseClock};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OwnedSemaphorePermit;
use tokio::task::JoinError;
use tracing::{debug, error, info, trace, warn};

use crate::gateway::{EngineGateway, GatewayError};
use crate::task::JobHandler;

/// States a job moves through between activation and settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Received from the activation stream, waiting for dispatch.
    Activated,
    /// Handler is running under the lease watchdog.
    Executing,
    /// Handler completed; the complete report is in flight.
    Completing,
    /// Handler failed; the fail report is in flight.
    Failing,
    /// Handler raised a business error; the throw-error report is in flight.
    ThrowingError,
    /// A terminal report was delivered (or given up on after retries).
    Terminal,
    /// The lease expired locally; capacity was reclaimed without a report.
    Abandoned,
}

impl JobState {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance(self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Activated, Executing)
                | (Executing, Completing)
                | (Executing, Failing)
                | (Executing, ThrowingError)
                | (Executing, Abandoned)
                | (Completing, Terminal)
                | (Failing, Terminal)
                | (ThrowingError, Terminal)
                | (Completing, Abandoned)
                | (Failing, Abandoned)
                | (ThrowingError, Abandoned)
        )
    }

    /// Whether the job is settled one way or the other.
    pub fn is_settled(self) -> bool {
        matches!(self, JobState::Terminal | JobState::Abandoned)
    }
}

/// Tracks one job's state and enforces legal transitions.
struct Lifecycle {
    job_key: JobKey,
    state: JobState,
}

impl Lifecycle {
    fn new(job_key: JobKey) -> Self {
        Self {
            job_key,
            state: JobState::Activated,
        }
    }

    fn advance(&mut self, next: JobState) {
        debug_assert!(
            self.state.can_advance(next),
            "invalid job state transition {:?} -> {:?}",
            self.state,
            next
        );
        trace!(job_key = %self.job_key, from = ?self.state, to = ?next, "job state transition");
        self.state = next;
    }
}

/// Worker-level knobs the lifecycle controller needs.
#[derive(Debug, Clone)]
pub(crate) struct LifecycleSettings {
    pub report_retry_limit: u32,
    pub report_backoff: BackoffPolicy,
    pub failure_backoff: BackoffPolicy,
}

/// Handle given to handlers for interacting with their own job.
///
/// Cloneable and cheap; all clones refer to the same lease clock.
#[derive(Clone)]
pub struct JobContext {
    job_key: JobKey,
    task_type: Arc<str>,
    gateway: Arc<dyn EngineGateway>,
    clock: Arc<Mutex<LeaseClock>>,
}

impl JobContext {
    fn new(job: &Job, gateway: Arc<dyn EngineGateway>, clock: Arc<Mutex<LeaseClock>>) -> Self {
        Self {
            job_key: job.key,
            task_type: job.task_type.as_str().into(),
            gateway,
            clock,
        }
    }

    /// Key of the job this context belongs to.
    pub fn job_key(&self) -> JobKey {
        self.job_key
    }

    /// Time left on the job's lease.
    pub fn remaining_lease(&self) -> Duration {
        self.clock.lock().unwrap().remaining()
    }

    /// Ask the engine for a fresh lease of `new_timeout`, measured from now.
    ///
    /// On success the local watchdog deadline moves with it. On failure the
    /// previous deadline stands and expiry handling proceeds normally.
    pub async fn extend_lease(&self, new_timeout: Duration) -> Result<(), GatewayError> {
        self.gateway
            .extend_job_timeout(self.job_key, new_timeout)
            .await?;
        self.clock.lock().unwrap().extend(new_timeout);
        debug!(
            job_key = %self.job_key,
            task_type = %self.task_type,
            timeout_ms = new_timeout.as_millis() as u64,
            "job lease extended"
        );
        Ok(())
    }
}

/// Drive one job from dispatch to settlement. Holds the capacity permit for
/// exactly as long as the job counts against the concurrency limit.
pub(crate) async fn run_job(
    job: Job,
    permit: OwnedSemaphorePermit,
    handler: Arc<dyn JobHandler>,
    gateway: Arc<dyn EngineGateway>,
    settings: Arc<LifecycleSettings>,
) {
    let _permit = permit;
    let mut lifecycle = Lifecycle::new(job.key);
    let clock = Arc::new(Mutex::new(LeaseClock::anchored(job.deadline)));
    let ctx = JobContext::new(&job, gateway.clone(), clock.clone());

    lifecycle.advance(JobState::Executing);
    debug!(
        job_key = %job.key,
        task_type = %job.task_type,
        retries = job.retries,
        "handler started"
    );

    // The handler runs in its own task: that spawn boundary is what isolates
    // handler faults from the dispatcher and from sibling jobs.
    let mut handler_task = tokio::spawn({
        let handler = handler.clone();
        let job = job.clone();
        let ctx = ctx.clone();
        async move { handler.handle(job, ctx).await }
    });

    let outcome = loop {
        let remaining = clock.lock().unwrap().remaining();
        tokio::select! {
            joined = &mut handler_task => {
                break match joined {
                    Ok(outcome) => outcome,
                    Err(fault) => fault_outcome(fault),
                };
            }
            _ = tokio::time::sleep(remaining) => {
                // A lease extension may have moved the deadline since this
                // sleep was armed; only a clock that is still expired after
                // re-checking abandons the job.
                if clock.lock().unwrap().has_expired() {
                    lifecycle.advance(JobState::Abandoned);
                    warn!(
                        job_key = %job.key,
                        task_type = %job.task_type,
                        "lease expired before the handler finished; abandoning job"
                    );
                    return;
                }
            }
        }
    };

    report_outcome(&job, outcome, lifecycle, &clock, gateway.as_ref(), &settings).await;
}

/// Convert a handler task fault into a reportable failure.
fn fault_outcome(fault: JoinError) -> JobOutcome {
    let message = if fault.is_panic() {
        match fault.into_panic().downcast::<String>() {
            Ok(text) => format!("handler panicked: {text}"),
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(text) => format!("handler panicked: {text}"),
                Err(_) => "handler panicked".to_owned(),
            },
        }
    } else {
        "handler task was cancelled".to_owned()
    };
    JobOutcome::fail(message)
}

/// The terminal RPC derived from a handler outcome.
enum TerminalCall {
    Complete {
        variables: Map<String, Value>,
    },
    Fail {
        retries: u32,
        error_message: String,
        backoff: Duration,
    },
    ThrowError {
        error_code: String,
        error_message: String,
    },
}

impl TerminalCall {
    fn name(&self) -> &'static str {
        match self {
            Self::Complete { .. } => "complete",
            Self::Fail { .. } => "fail",
            Self::ThrowError { .. } => "throw_error",
        }
    }

    async fn issue(
        &self,
        gateway: &dyn EngineGateway,
        job_key: JobKey,
    ) -> Result<(), GatewayError> {
        match self {
            Self::Complete { variables } => gateway.complete_job(job_key, variables.clone()).await,
            Self::Fail {
                retries,
                error_message,
                backoff,
            } => {
                gateway
                    .fail_job(job_key, *retries, error_message, Some(*backoff))
                    .await
            }
            Self::ThrowError {
                error_code,
                error_message,
            } => gateway.throw_error(job_key, error_code, error_message).await,
        }
    }
}

async fn report_outcome(
    job: &Job,
    outcome: JobOutcome,
    mut lifecycle: Lifecycle,
    clock: &Mutex<LeaseClock>,
    gateway: &dyn EngineGateway,
    settings: &LifecycleSettings,
) {
    let (next_state, call) = match outcome {
        JobOutcome::Completed { variables } => {
            (JobState::Completing, TerminalCall::Complete { variables })
        }
        JobOutcome::Failed {
            retries,
            error_message,
            backoff,
        } => (
            JobState::Failing,
            TerminalCall::Fail {
                retries: retries.unwrap_or_else(|| job.retries.saturating_sub(1)),
                error_message,
                backoff: backoff.unwrap_or_else(|| settings.failure_backoff.delay_for(0)),
            },
        ),
        JobOutcome::BusinessError {
            error_code,
            error_message,
        } => (
            JobState::ThrowingError,
            TerminalCall::ThrowError {
                error_code,
                error_message,
            },
        ),
    };
    lifecycle.advance(next_state);

    for attempt in 0u32.. {
        // The lease is checked before every attempt: a job whose deadline
        // has passed must never be the subject of a terminal report.
        if clock.lock().unwrap().has_expired() {
            lifecycle.advance(JobState::Abandoned);
            warn!(
                job_key = %job.key,
                task_type = %job.task_type,
                outcome = call.name(),
                "lease expired before the outcome was reported; abandoning job"
            );
            return;
        }

        match call.issue(gateway, job.key).await {
            Ok(()) => {
                lifecycle.advance(JobState::Terminal);
                info!(
                    job_key = %job.key,
                    task_type = %job.task_type,
                    outcome = call.name(),
                    "job settled"
                );
                return;
            }
            Err(err) if err.is_job_deactivated() => {
                lifecycle.advance(JobState::Terminal);
                warn!(
                    job_key = %job.key,
                    task_type = %job.task_type,
                    error = %err,
                    "job was already deactivated; dropping the report"
                );
                return;
            }
            Err(err) if err.is_transient() && attempt < settings.report_retry_limit => {
                warn!(
                    job_key = %job.key,
                    attempt,
                    error = %err,
                    "terminal report failed; retrying"
                );
                tokio::time::sleep(settings.report_backoff.jittered(attempt)).await;
            }
            Err(err) => {
                lifecycle.advance(JobState::Terminal);
                error!(
                    job_key = %job.key,
                    task_type = %job.task_type,
                    outcome = call.name(),
                    error = %err,
                    "giving up on reporting the job outcome; the lease will lapse server-side"
                );
                return;
            }
        }
    }
}
