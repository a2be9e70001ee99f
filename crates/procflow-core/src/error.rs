//! Core domain errors.

use thiserror::Error;

/// Errors raised when reading typed variables off a job.
#[derive(Debug, Error)]
pub enum VariableError {
    /// The variable is not present on the job.
    #[error("variable '{0}' is not present")]
    Missing(String),

    /// The variable exists but does not deserialize into the requested type.
    #[error("variable '{name}' could not be deserialized: {source}")]
    Invalid {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}
