//! The narrow RPC contract the engine is driven through.
//!
//! The core engine depends only on [`EngineGateway`]; the gRPC transport
//! lives behind it in [`crate::grpc`], and tests substitute a recording
//! implementation.

use async_trait::async_trait;
use procflow_core::{ActivationRequest, Job, JobKey};
use serde_json::{Map, Value};
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;
use tokio_stream::Stream;

/// Stream of job batches produced by one activation call.
pub type JobBatchStream = Pin<Box<dyn Stream<Item = Result<Vec<Job>, GatewayError>> + Send>>;

/// Failures surfaced by the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The engine cannot currently be reached.
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    /// The engine is shedding load.
    #[error("engine back pressure: {0}")]
    BackPressure(String),

    /// The call ran past its deadline or was cancelled by the transport.
    #[error("request timed out: {0}")]
    DeadlineExceeded(String),

    /// Connection-level failure below the RPC layer.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The job no longer exists or was already moved out of the activated
    /// state by the engine.
    #[error("job not found or already deactivated: {0}")]
    JobDeactivated(String),

    /// The engine rejected the request as malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The engine reported an internal error.
    #[error("engine internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Whether the failure is worth retrying with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_)
                | Self::BackPressure(_)
                | Self::DeadlineExceeded(_)
                | Self::Transport(_)
        )
    }

    /// Whether the failure means the job already left the activated state,
    /// making further reports for it pointless.
    pub fn is_job_deactivated(&self) -> bool {
        matches!(self, Self::JobDeactivated(_))
    }
}

/// RPC surface of the remote engine, as consumed by the worker.
///
/// Calls for a single job are strictly ordered by the lifecycle controller;
/// the gateway itself carries no ordering obligations across jobs.
#[async_trait]
pub trait EngineGateway: Send + Sync + 'static {
    /// Claim up to `request.max_jobs_to_activate` jobs of one task type.
    /// The stream yields zero or more batches and ends when the engine
    /// closes the request.
    async fn activate_jobs(
        &self,
        request: ActivationRequest,
    ) -> Result<JobBatchStream, GatewayError>;

    /// Report successful completion with output variables.
    async fn complete_job(
        &self,
        job_key: JobKey,
        variables: Map<String, Value>,
    ) -> Result<(), GatewayError>;

    /// Report a recoverable failure with the remaining retry count and an
    /// optional re-activation backoff.
    async fn fail_job(
        &self,
        job_key: JobKey,
        retries: u32,
        error_message: &str,
        retry_backoff: Option<Duration>,
    ) -> Result<(), GatewayError>;

    /// Report a business error routed to error-boundary logic.
    async fn throw_error(
        &self,
        job_key: JobKey,
        error_code: &str,
        error_message: &str,
    ) -> Result<(), GatewayError>;

    /// Replace the job's lease timeout, measured from when the engine
    /// processes the call.
    async fn extend_job_timeout(
        &self,
        job_key: JobKey,
        new_timeout: Duration,
    ) -> Result<(), GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(GatewayError::Unavailable("down".into()).is_transient());
        assert!(GatewayError::BackPressure("busy".into()).is_transient());
        assert!(GatewayError::Transport("reset".into()).is_transient());
        assert!(!GatewayError::InvalidRequest("bad".into()).is_transient());
        assert!(!GatewayError::JobDeactivated("gone".into()).is_transient());
        assert!(!GatewayError::Internal("bug".into()).is_transient());
    }

    #[test]
    fn test_deactivated_classification() {
        assert!(GatewayError::JobDeactivated("gone".into()).is_job_deactivated());
        assert!(!GatewayError::Unavailable("down".into()).is_job_deactivated());
    }
}
