//! Worker configuration errors.
//!
//! These are the only fatal errors in the crate: they prevent the worker
//! from starting. Everything at runtime is retried, isolated per job, or
//! logged and survived.

use thiserror::Error;

/// Errors raised while validating worker registrations at build time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No engine gateway was configured.
    #[error("no engine gateway configured")]
    NoGateway,

    /// The worker has no task types registered.
    #[error("no task types registered")]
    NoTasks,

    /// The same task type was registered twice.
    #[error("duplicate task type: {0}")]
    DuplicateTaskType(String),

    /// A registration used an empty task type.
    #[error("task type must not be empty")]
    EmptyTaskType,

    /// A registration requested zero concurrency.
    #[error("max concurrent jobs must be at least 1 for task '{0}'")]
    ZeroConcurrency(String),

    /// A registration requested a zero lease timeout.
    #[error("lease timeout must be positive for task '{0}'")]
    ZeroLeaseTimeout(String),
}
