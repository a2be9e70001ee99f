//! Terminal outcome produced by a job handler.

use serde_json::{Map, Value};
use std::time::Duration;

/// Outcome of one handler invocation, consumed exactly once by the job
/// lifecycle controller.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// The job finished successfully; `variables` are merged back into the
    /// process instance.
    Completed { variables: Map<String, Value> },

    /// The job failed in a recoverable way. The engine decrements retries and
    /// may re-activate the job after `backoff`.
    Failed {
        /// Remaining retries to report. `None` reports `job.retries - 1`,
        /// floored at zero.
        retries: Option<u32>,
        error_message: String,
        /// Delay the engine should wait before making the job activatable
        /// again. `None` lets the worker's failure policy pick one.
        backoff: Option<Duration>,
    },

    /// A domain-level error routed to error-boundary logic in the process,
    /// distinct from an unexpected fault. Does not decrement retries.
    BusinessError {
        error_code: String,
        error_message: String,
    },
}

impl JobOutcome {
    /// Complete the job without output variables.
    pub fn complete() -> Self {
        Self::Completed {
            variables: Map::new(),
        }
    }

    /// Complete the job with output variables.
    pub fn complete_with(variables: Map<String, Value>) -> Self {
        Self::Completed { variables }
    }

    /// Fail the job, letting the lifecycle controller decrement retries and
    /// pick a backoff.
    pub fn fail(error_message: impl Into<String>) -> Self {
        Self::Failed {
            retries: None,
            error_message: error_message.into(),
            backoff: None,
        }
    }

    /// Fail the job with an explicit remaining-retries count.
    pub fn fail_with_retries(retries: u32, error_message: impl Into<String>) -> Self {
        Self::Failed {
            retries: Some(retries),
            error_message: error_message.into(),
            backoff: None,
        }
    }

    /// Raise a business error with the given code.
    pub fn business_error(error_code: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self::BusinessError {
            error_code: error_code.into(),
            error_message: error_message.into(),
        }
    }

    /// Set the backoff hint on a `Failed` outcome. No-op for other variants.
    pub fn with_backoff(mut self, delay: Duration) -> Self {
        if let Self::Failed { backoff, .. } = &mut self {
            *backoff = Some(delay);
        }
        self
    }

    /// Short name used in log events.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
            Self::BusinessError { .. } => "business_error",
        }
    }
}
