//! Procflow Job Worker Engine
//!
//! This crate contains the job-activation-and-lifecycle engine:
//! - Activation polling with capacity-aware request sizing and backoff
//! - Bounded-concurrency dispatch with per-job fault isolation
//! - A per-job lifecycle controller enforcing the one-terminal-report rule
//!   and the lease deadline
//!
//! Handlers are registered per task type on [`JobWorkerBuilder`]; the engine
//! is reached through the [`EngineGateway`] trait, implemented for gRPC by
//! [`GrpcEngineGateway`].

pub mod config;
pub mod error;
pub mod gateway;
pub mod grpc;
pub mod task;
pub mod worker;

mod dispatcher;
mod lifecycle;
mod poller;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::WorkerConfig;
pub use error::ConfigError;
pub use gateway::{EngineGateway, GatewayError, JobBatchStream};
pub use grpc::GrpcEngineGateway;
pub use lifecycle::{JobContext, JobState};
pub use task::{handler_fn, HandlerFn, JobHandler, TaskConfig, TaskRouter};
pub use worker::{JobWorker, JobWorkerBuilder, WorkerHandle};

// Domain types handlers touch constantly
pub use procflow_core::{ActivationRequest, BackoffPolicy, Job, JobKey, JobOutcome};
