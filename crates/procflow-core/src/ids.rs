//! Newtype wrapper for the engine-assigned job key.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier of a job, assigned by the engine on activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobKey(i64);

impl JobKey {
    /// Create a JobKey from the raw engine value.
    pub fn new(key: i64) -> Self {
        Self(key)
    }

    /// Get the raw engine value.
    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for JobKey {
    fn from(key: i64) -> Self {
        Self(key)
    }
}

impl From<JobKey> for i64 {
    fn from(key: JobKey) -> Self {
        key.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_key_display() {
        let key = JobKey::new(42);
        assert_eq!(format!("{}", key), "42");
    }

    #[test]
    fn test_job_key_roundtrip() {
        let key = JobKey::from(7);
        assert_eq!(i64::from(key), 7);
    }
}
