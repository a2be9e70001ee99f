//! gRPC implementation of the engine gateway.

use async_trait::async_trait;
use procflow_core::{ActivationRequest, Job, JobKey};
use procflow_proto::{convert, pb, GatewayClient};
use serde_json::{Map, Value};
use std::time::Duration;
use tokio_stream::StreamExt;
use tonic::transport::Channel;
use tonic::{Code, Status};
use tracing::warn;

use crate::gateway::{EngineGateway, GatewayError, JobBatchStream};

/// Engine gateway over a tonic channel.
///
/// The underlying client is a cheap handle over the shared channel, so each
/// call clones it rather than serializing on a lock.
#[derive(Debug, Clone)]
pub struct GrpcEngineGateway {
    client: GatewayClient<Channel>,
}

impl GrpcEngineGateway {
    /// Connect to the gateway at the given endpoint URI.
    pub async fn connect(endpoint: impl Into<String>) -> Result<Self, GatewayError> {
        let channel = Channel::from_shared(endpoint.into())
            .map_err(|error| GatewayError::InvalidRequest(error.to_string()))?
            .connect()
            .await
            .map_err(|error| GatewayError::Transport(error.to_string()))?;
        Ok(Self::new(channel))
    }

    /// Wrap an already established channel.
    pub fn new(channel: Channel) -> Self {
        Self {
            client: GatewayClient::new(channel),
        }
    }
}

impl From<Status> for GatewayError {
    fn from(status: Status) -> Self {
        let message = status.message().to_owned();
        match status.code() {
            Code::Unavailable => GatewayError::Unavailable(message),
            Code::ResourceExhausted => GatewayError::BackPressure(message),
            Code::DeadlineExceeded | Code::Cancelled => GatewayError::DeadlineExceeded(message),
            Code::NotFound | Code::FailedPrecondition => GatewayError::JobDeactivated(message),
            Code::InvalidArgument => GatewayError::InvalidRequest(message),
            _ => GatewayError::Internal(message),
        }
    }
}

/// Convert one wire batch, dropping jobs whose documents do not parse. A
/// malformed job is an engine-side anomaly and must not poison the batch.
fn convert_batch(response: pb::ActivateJobsResponse) -> Vec<Job> {
    response
        .jobs
        .into_iter()
        .filter_map(|proto| match Job::try_from(proto) {
            Ok(job) => Some(job),
            Err(error) => {
                warn!(error = %error, "discarding malformed job from activation stream");
                None
            }
        })
        .collect()
}

#[async_trait]
impl EngineGateway for GrpcEngineGateway {
    async fn activate_jobs(
        &self,
        request: ActivationRequest,
    ) -> Result<JobBatchStream, GatewayError> {
        let mut client = self.client.clone();
        let response = client
            .activate_jobs(pb::ActivateJobsRequest::from(&request))
            .await
            .map_err(GatewayError::from)?;

        let batches = response.into_inner().map(|item| match item {
            Ok(batch) => Ok(convert_batch(batch)),
            Err(status) => Err(GatewayError::from(status)),
        });
        Ok(Box::pin(batches))
    }

    async fn complete_job(
        &self,
        job_key: JobKey,
        variables: Map<String, Value>,
    ) -> Result<(), GatewayError> {
        let mut client = self.client.clone();
        client
            .complete_job(convert::complete_job_request(job_key, &variables))
            .await
            .map_err(GatewayError::from)?;
        Ok(())
    }

    async fn fail_job(
        &self,
        job_key: JobKey,
        retries: u32,
        error_message: &str,
        retry_backoff: Option<Duration>,
    ) -> Result<(), GatewayError> {
        let mut client = self.client.clone();
        client
            .fail_job(convert::fail_job_request(
                job_key,
                retries,
                error_message,
                retry_backoff,
            ))
            .await
            .map_err(GatewayError::from)?;
        Ok(())
    }

    async fn throw_error(
        &self,
        job_key: JobKey,
        error_code: &str,
        error_message: &str,
    ) -> Result<(), GatewayError> {
        let mut client = self.client.clone();
        client
            .throw_error(convert::throw_error_request(
                job_key,
                error_code,
                error_message,
            ))
            .await
            .map_err(GatewayError::from)?;
        Ok(())
    }

    async fn extend_job_timeout(
        &self,
        job_key: JobKey,
        new_timeout: Duration,
    ) -> Result<(), GatewayError> {
        let mut client = self.client.clone();
        client
            .update_job_timeout(convert::update_job_timeout_request(job_key, new_timeout))
            .await
            .map_err(GatewayError::from)?;
        Ok(())
    }
}
