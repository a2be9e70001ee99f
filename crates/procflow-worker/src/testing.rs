//! Test support: a scripted, recording engine gateway.

use async_trait::async_trait;
use procflow_core::{ActivationRequest, Job, JobKey};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::gateway::{EngineGateway, GatewayError, JobBatchStream};

/// Every call a test observed on the gateway, in order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum GatewayCall {
    Activate(ActivationRequest),
    Complete {
        job_key: JobKey,
        variables: Map<String, Value>,
    },
    Fail {
        job_key: JobKey,
        retries: u32,
        error_message: String,
        backoff: Option<Duration>,
    },
    ThrowError {
        job_key: JobKey,
        error_code: String,
        error_message: String,
    },
    ExtendTimeout {
        job_key: JobKey,
        timeout: Duration,
    },
}

/// Scripted gateway: activation calls yield pre-seeded job batches (then
/// hang like an idle long poll), and error queues inject failures into
/// activation or job-report calls.
pub(crate) struct RecordingGateway {
    calls: Mutex<Vec<GatewayCall>>,
    batches: Mutex<VecDeque<Vec<Job>>>,
    activation_errors: Mutex<VecDeque<GatewayError>>,
    rpc_errors: Mutex<VecDeque<GatewayError>>,
}

impl RecordingGateway {
    pub(crate) fn new() -> Arc<Self> {
        Self::with_batches(Vec::new())
    }

    pub(crate) fn with_batches(batches: Vec<Vec<Job>>) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            batches: Mutex::new(batches.into()),
            activation_errors: Mutex::new(VecDeque::new()),
            rpc_errors: Mutex::new(VecDeque::new()),
        })
    }

    /// Fail the next activation call with `error`.
    pub(crate) fn push_activation_error(&self, error: GatewayError) {
        self.activation_errors.lock().unwrap().push_back(error);
    }

    /// Fail the next job-report call (complete/fail/throw-error/extend)
    /// with `error`.
    pub(crate) fn push_rpc_error(&self, error: GatewayError) {
        self.rpc_errors.lock().unwrap().push_back(error);
    }

    pub(crate) fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn activation_requests(&self) -> Vec<ActivationRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::Activate(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    /// Calls that report on a job (everything except activation).
    pub(crate) fn report_calls(&self) -> Vec<GatewayCall> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, GatewayCall::Activate(_)))
            .collect()
    }

    fn record(&self, call: GatewayCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_rpc_result(&self) -> Result<(), GatewayError> {
        match self.rpc_errors.lock().unwrap().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Wait until `predicate` holds over the recorded calls, or panic after
/// `timeout`.
pub(crate) async fn wait_until(
    gateway: &RecordingGateway,
    timeout: Duration,
    predicate: impl Fn(&[GatewayCall]) -> bool,
) {
    let check = async {
        loop {
            if predicate(&gateway.calls()) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };
    tokio::time::timeout(timeout, check)
        .await
        .expect("condition not reached before timeout");
}

/// A job with the given key and a lease expiring `deadline_in` from now.
pub(crate) fn sample_job(key: i64, retries: u32, deadline_in: Duration) -> Job {
    let deadline_in = chrono::Duration::from_std(deadline_in).expect("deadline in range");
    Job {
        key: JobKey::new(key),
        task_type: "ship-order".to_owned(),
        process_instance_key: 1000 + key,
        bpmn_process_id: "order-process".to_owned(),
        element_id: "ship".to_owned(),
        retries,
        deadline: chrono::Utc::now() + deadline_in,
        variables: Map::new(),
        custom_headers: Default::default(),
    }
}

#[async_trait]
impl EngineGateway for RecordingGateway {
    async fn activate_jobs(
        &self,
        request: ActivationRequest,
    ) -> Result<JobBatchStream, GatewayError> {
        self.record(GatewayCall::Activate(request));
        if let Some(error) = self.activation_errors.lock().unwrap().pop_front() {
            return Err(error);
        }
        match self.batches.lock().unwrap().pop_front() {
            Some(jobs) => Ok(Box::pin(tokio_stream::iter(vec![Ok(jobs)]))),
            // No more scripted work: behave like an idle long poll.
            None => Ok(Box::pin(tokio_stream::pending())),
        }
    }

    async fn complete_job(
        &self,
        job_key: JobKey,
        variables: Map<String, Value>,
    ) -> Result<(), GatewayError> {
        self.record(GatewayCall::Complete { job_key, variables });
        self.next_rpc_result()
    }

    async fn fail_job(
        &self,
        job_key: JobKey,
        retries: u32,
        error_message: &str,
        retry_backoff: Option<Duration>,
    ) -> Result<(), GatewayError> {
        self.record(GatewayCall::Fail {
            job_key,
            retries,
            error_message: error_message.to_owned(),
            backoff: retry_backoff,
        });
        self.next_rpc_result()
    }

    async fn throw_error(
        &self,
        job_key: JobKey,
        error_code: &str,
        error_message: &str,
    ) -> Result<(), GatewayError> {
        self.record(GatewayCall::ThrowError {
            job_key,
            error_code: error_code.to_owned(),
            error_message: error_message.to_owned(),
        });
        self.next_rpc_result()
    }

    async fn extend_job_timeout(
        &self,
        job_key: JobKey,
        new_timeout: Duration,
    ) -> Result<(), GatewayError> {
        self.record(GatewayCall::ExtendTimeout {
            job_key,
            timeout: new_timeout,
        });
        self.next_rpc_result()
    }
}
