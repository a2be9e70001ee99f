//! Converters between wire messages and domain types.

use crate::pb;
use chrono::{DateTime, TimeZone, Utc};
use procflow_core::{ActivationRequest, Job, JobKey};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while mapping wire messages into domain types.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The variables document is not a valid JSON object.
    #[error("invalid variables document for job {job_key}: {source}")]
    Variables {
        job_key: i64,
        #[source]
        source: serde_json::Error,
    },

    /// The custom headers document is not a valid JSON string map.
    #[error("invalid custom headers document for job {job_key}: {source}")]
    CustomHeaders {
        job_key: i64,
        #[source]
        source: serde_json::Error,
    },

    /// The deadline is outside the representable timestamp range.
    #[error("invalid deadline timestamp {millis} for job {job_key}")]
    Deadline { job_key: i64, millis: i64 },
}

fn duration_to_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

fn parse_variables(job_key: i64, document: &str) -> Result<Map<String, Value>, ConvertError> {
    if document.is_empty() {
        return Ok(Map::new());
    }
    serde_json::from_str(document).map_err(|source| ConvertError::Variables { job_key, source })
}

fn parse_custom_headers(
    job_key: i64,
    document: &str,
) -> Result<HashMap<String, String>, ConvertError> {
    if document.is_empty() {
        return Ok(HashMap::new());
    }
    serde_json::from_str(document).map_err(|source| ConvertError::CustomHeaders { job_key, source })
}

fn parse_deadline(job_key: i64, millis: i64) -> Result<DateTime<Utc>, ConvertError> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or(ConvertError::Deadline { job_key, millis })
}

// ============================================================================
// ActivatedJob -> Job
// ============================================================================

impl TryFrom<pb::ActivatedJob> for Job {
    type Error = ConvertError;

    fn try_from(proto: pb::ActivatedJob) -> Result<Self, Self::Error> {
        let variables = parse_variables(proto.key, &proto.variables)?;
        let custom_headers = parse_custom_headers(proto.key, &proto.custom_headers)?;
        let deadline = parse_deadline(proto.key, proto.deadline)?;

        Ok(Job {
            key: JobKey::new(proto.key),
            task_type: proto.r#type,
            process_instance_key: proto.process_instance_key,
            bpmn_process_id: proto.bpmn_process_id,
            element_id: proto.element_id,
            retries: u32::try_from(proto.retries).unwrap_or(0),
            deadline,
            variables,
            custom_headers,
        })
    }
}

// ============================================================================
// Domain -> request messages
// ============================================================================

impl From<&ActivationRequest> for pb::ActivateJobsRequest {
    fn from(request: &ActivationRequest) -> Self {
        pb::ActivateJobsRequest {
            r#type: request.task_type.clone(),
            worker: request.worker.clone(),
            timeout: duration_to_millis(request.timeout),
            max_jobs_to_activate: i32::try_from(request.max_jobs_to_activate).unwrap_or(i32::MAX),
            fetch_variable: request.fetch_variables.clone(),
            request_timeout: duration_to_millis(request.request_timeout),
        }
    }
}

/// Build a complete-job request; an empty variable map is sent as an empty
/// document.
pub fn complete_job_request(
    job_key: JobKey,
    variables: &Map<String, Value>,
) -> pb::CompleteJobRequest {
    let variables = if variables.is_empty() {
        String::new()
    } else {
        Value::Object(variables.clone()).to_string()
    };
    pb::CompleteJobRequest {
        job_key: job_key.value(),
        variables,
    }
}

/// Build a fail-job request. A missing backoff is sent as zero, which leaves
/// the job immediately activatable.
pub fn fail_job_request(
    job_key: JobKey,
    retries: u32,
    error_message: &str,
    retry_backoff: Option<Duration>,
) -> pb::FailJobRequest {
    pb::FailJobRequest {
        job_key: job_key.value(),
        retries: i32::try_from(retries).unwrap_or(i32::MAX),
        error_message: error_message.to_owned(),
        retry_back_off: retry_backoff.map(duration_to_millis).unwrap_or(0),
    }
}

/// Build a throw-error request.
pub fn throw_error_request(
    job_key: JobKey,
    error_code: &str,
    error_message: &str,
) -> pb::ThrowErrorRequest {
    pb::ThrowErrorRequest {
        job_key: job_key.value(),
        error_code: error_code.to_owned(),
        error_message: error_message.to_owned(),
    }
}

/// Build an update-job-timeout request.
pub fn update_job_timeout_request(
    job_key: JobKey,
    new_timeout: Duration,
) -> pb::UpdateJobTimeoutRequest {
    pb::UpdateJobTimeoutRequest {
        job_key: job_key.value(),
        timeout: duration_to_millis(new_timeout),
    }
}
