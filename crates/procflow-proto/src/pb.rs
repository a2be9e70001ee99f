//! Message and service definitions for `procflow.gateway.v1`.
//!
//! Durations and deadlines travel as millisecond integers; job variables and
//! custom headers travel as JSON document strings.

/// Claims jobs of one task type on behalf of a named worker.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ActivateJobsRequest {
    /// Task type to activate jobs for.
    #[prost(string, tag = "1")]
    pub r#type: String,
    /// Name the worker identifies itself with.
    #[prost(string, tag = "2")]
    pub worker: String,
    /// Lease duration in milliseconds granted per activated job.
    #[prost(int64, tag = "3")]
    pub timeout: i64,
    /// Upper bound on jobs returned by this request.
    #[prost(int32, tag = "4")]
    pub max_jobs_to_activate: i32,
    /// Variables to fetch per job; empty fetches all.
    #[prost(string, repeated, tag = "5")]
    pub fetch_variable: Vec<String>,
    /// How long the gateway may hold the request open, in milliseconds.
    #[prost(int64, tag = "6")]
    pub request_timeout: i64,
}

/// One chunk of the activation stream; the stream may carry 0..N of these.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ActivateJobsResponse {
    #[prost(message, repeated, tag = "1")]
    pub jobs: Vec<ActivatedJob>,
}

/// A job leased to a worker.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ActivatedJob {
    /// Engine-assigned job key.
    #[prost(int64, tag = "1")]
    pub key: i64,
    /// Task type the job was activated for.
    #[prost(string, tag = "2")]
    pub r#type: String,
    /// Key of the owning process instance.
    #[prost(int64, tag = "3")]
    pub process_instance_key: i64,
    /// Id of the process definition.
    #[prost(string, tag = "4")]
    pub bpmn_process_id: String,
    /// Version of the process definition.
    #[prost(int32, tag = "5")]
    pub process_definition_version: i32,
    /// Key of the process definition.
    #[prost(int64, tag = "6")]
    pub process_definition_key: i64,
    /// Id of the service task element.
    #[prost(string, tag = "7")]
    pub element_id: String,
    /// Key of the element instance.
    #[prost(int64, tag = "8")]
    pub element_instance_key: i64,
    /// Custom headers as a JSON object of strings.
    #[prost(string, tag = "9")]
    pub custom_headers: String,
    /// Worker name the job was handed to.
    #[prost(string, tag = "10")]
    pub worker: String,
    /// Remaining retries.
    #[prost(int32, tag = "11")]
    pub retries: i32,
    /// Lease deadline as unix epoch milliseconds.
    #[prost(int64, tag = "12")]
    pub deadline: i64,
    /// Job variables as a JSON object document.
    #[prost(string, tag = "13")]
    pub variables: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CompleteJobRequest {
    #[prost(int64, tag = "1")]
    pub job_key: i64,
    /// Output variables as a JSON object document; empty means none.
    #[prost(string, tag = "2")]
    pub variables: String,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct CompleteJobResponse {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FailJobRequest {
    #[prost(int64, tag = "1")]
    pub job_key: i64,
    /// Remaining retries to record on the job.
    #[prost(int32, tag = "2")]
    pub retries: i32,
    #[prost(string, tag = "3")]
    pub error_message: String,
    /// Delay in milliseconds before the job becomes activatable again.
    #[prost(int64, tag = "4")]
    pub retry_back_off: i64,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct FailJobResponse {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ThrowErrorRequest {
    #[prost(int64, tag = "1")]
    pub job_key: i64,
    #[prost(string, tag = "2")]
    pub error_code: String,
    #[prost(string, tag = "3")]
    pub error_message: String,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct ThrowErrorResponse {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateJobTimeoutRequest {
    #[prost(int64, tag = "1")]
    pub job_key: i64,
    /// New lease duration in milliseconds, measured from when the request is
    /// processed.
    #[prost(int64, tag = "2")]
    pub timeout: i64,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct UpdateJobTimeoutResponse {}

/// Client implementation for the Gateway service, written in the shape tonic
/// codegen emits.
pub mod gateway_client {
    #![allow(unused_variables, dead_code, missing_docs, clippy::wildcard_imports)]
    use tonic::codegen::http::Uri;
    use tonic::codegen::*;

    #[derive(Debug, Clone)]
    pub struct GatewayClient<T> {
        inner: tonic::client::Grpc<T>,
    }

    impl GatewayClient<tonic::transport::Channel> {
        /// Attempt to create a new client by connecting to a given endpoint.
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }

    impl<T> GatewayClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }

        pub fn with_origin(inner: T, origin: Uri) -> Self {
            let inner = tonic::client::Grpc::with_origin(inner, origin);
            Self { inner }
        }

        /// Iterates through all known activatable jobs of the requested type
        /// and leases them to this worker as long as capacity allows.
        pub async fn activate_jobs(
            &mut self,
            request: impl tonic::IntoRequest<super::ActivateJobsRequest>,
        ) -> std::result::Result<
            tonic::Response<tonic::codec::Streaming<super::ActivateJobsResponse>>,
            tonic::Status,
        > {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::unknown(format!("Service was not ready: {}", e.into()))
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static(
                "/procflow.gateway.v1.Gateway/ActivateJobs",
            );
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("procflow.gateway.v1.Gateway", "ActivateJobs"));
            self.inner.server_streaming(req, path, codec).await
        }

        /// Marks the job as completed and hands its output variables back to
        /// the owning process instance.
        pub async fn complete_job(
            &mut self,
            request: impl tonic::IntoRequest<super::CompleteJobRequest>,
        ) -> std::result::Result<tonic::Response<super::CompleteJobResponse>, tonic::Status>
        {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::unknown(format!("Service was not ready: {}", e.into()))
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static(
                "/procflow.gateway.v1.Gateway/CompleteJob",
            );
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("procflow.gateway.v1.Gateway", "CompleteJob"));
            self.inner.unary(req, path, codec).await
        }

        /// Marks the job as failed with a decremented retry count.
        pub async fn fail_job(
            &mut self,
            request: impl tonic::IntoRequest<super::FailJobRequest>,
        ) -> std::result::Result<tonic::Response<super::FailJobResponse>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::unknown(format!("Service was not ready: {}", e.into()))
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path =
                http::uri::PathAndQuery::from_static("/procflow.gateway.v1.Gateway/FailJob");
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("procflow.gateway.v1.Gateway", "FailJob"));
            self.inner.unary(req, path, codec).await
        }

        /// Reports a business error for the job, routed to error-boundary
        /// logic in the process.
        pub async fn throw_error(
            &mut self,
            request: impl tonic::IntoRequest<super::ThrowErrorRequest>,
        ) -> std::result::Result<tonic::Response<super::ThrowErrorResponse>, tonic::Status>
        {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::unknown(format!("Service was not ready: {}", e.into()))
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static(
                "/procflow.gateway.v1.Gateway/ThrowError",
            );
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("procflow.gateway.v1.Gateway", "ThrowError"));
            self.inner.unary(req, path, codec).await
        }

        /// Replaces the job's lease timeout, measured from when the request
        /// is processed.
        pub async fn update_job_timeout(
            &mut self,
            request: impl tonic::IntoRequest<super::UpdateJobTimeoutRequest>,
        ) -> std::result::Result<tonic::Response<super::UpdateJobTimeoutResponse>, tonic::Status>
        {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::unknown(format!("Service was not ready: {}", e.into()))
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static(
                "/procflow.gateway.v1.Gateway/UpdateJobTimeout",
            );
            let mut req = request.into_request();
            req.extensions_mut().insert(GrpcMethod::new(
                "procflow.gateway.v1.Gateway",
                "UpdateJobTimeout",
            ));
            self.inner.unary(req, path, codec).await
        }
    }
}
