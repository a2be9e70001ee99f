//! Job and activation request types.

use crate::{JobKey, VariableError};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;

/// A unit of work claimed from the remote engine.
///
/// A job is owned exclusively by one lifecycle controller from activation
/// until a terminal report succeeds or the lease expires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Engine-assigned key, unique and immutable.
    pub key: JobKey,

    /// Task type that selects the handler.
    pub task_type: String,

    /// Key of the process instance this job belongs to.
    pub process_instance_key: i64,

    /// Id of the process definition the instance was created from.
    pub bpmn_process_id: String,

    /// Id of the service task element within the process definition.
    pub element_id: String,

    /// Remaining attempt count.
    pub retries: u32,

    /// Absolute wall-clock time after which the lease is invalid.
    pub deadline: DateTime<Utc>,

    /// Job variables, one JSON value per name.
    pub variables: Map<String, Value>,

    /// Custom headers configured on the service task.
    pub custom_headers: HashMap<String, String>,
}

impl Job {
    /// Deserialize a single variable into a concrete type.
    pub fn variable<T: DeserializeOwned>(&self, name: &str) -> Result<T, VariableError> {
        let value = self
            .variables
            .get(name)
            .ok_or_else(|| VariableError::Missing(name.to_owned()))?;
        serde_json::from_value(value.clone()).map_err(|source| VariableError::Invalid {
            name: name.to_owned(),
            source,
        })
    }

    /// Look up a custom header by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.custom_headers.get(name).map(String::as_str)
    }

    /// Whether the lease deadline has already passed at `now`.
    pub fn lease_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.deadline <= now
    }
}

/// Parameters of a single activation poll.
///
/// Constructed fresh per poll cycle; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationRequest {
    /// Task type to activate jobs for.
    pub task_type: String,

    /// Name the worker identifies itself with.
    pub worker: String,

    /// Lease duration the engine should grant per activated job.
    pub timeout: Duration,

    /// Upper bound on jobs returned by this request. Always >= 1 and never
    /// more than the free dispatch capacity at the time of the request.
    pub max_jobs_to_activate: u32,

    /// Variables to fetch per job; empty fetches all.
    pub fetch_variables: Vec<String>,

    /// How long the engine may hold the request open waiting for jobs.
    pub request_timeout: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use serde_json::json;

    fn job_with_variables(variables: Map<String, Value>) -> Job {
        Job {
            key: JobKey::new(1),
            task_type: "ship-order".to_owned(),
            process_instance_key: 10,
            bpmn_process_id: "order-process".to_owned(),
            element_id: "ship".to_owned(),
            retries: 3,
            deadline: Utc::now() + ChronoDuration::seconds(30),
            variables,
            custom_headers: HashMap::from([("carrier".to_owned(), "acme".to_owned())]),
        }
    }

    #[test]
    fn test_variable_typed_access() {
        let mut variables = Map::new();
        variables.insert("order_id".to_owned(), json!("ord-7"));
        variables.insert("amount".to_owned(), json!(12));
        let job = job_with_variables(variables);

        let order_id: String = job.variable("order_id").unwrap();
        let amount: u32 = job.variable("amount").unwrap();
        assert_eq!(order_id, "ord-7");
        assert_eq!(amount, 12);
    }

    #[test]
    fn test_variable_missing() {
        let job = job_with_variables(Map::new());
        let err = job.variable::<String>("order_id").unwrap_err();
        assert!(matches!(err, VariableError::Missing(_)));
    }

    #[test]
    fn test_variable_wrong_shape() {
        let mut variables = Map::new();
        variables.insert("amount".to_owned(), json!("not a number"));
        let job = job_with_variables(variables);

        let err = job.variable::<u32>("amount").unwrap_err();
        assert!(matches!(err, VariableError::Invalid { .. }));
    }

    #[test]
    fn test_header_lookup() {
        let job = job_with_variables(Map::new());
        assert_eq!(job.header("carrier"), Some("acme"));
        assert_eq!(job.header("missing"), None);
    }

    #[test]
    fn test_lease_expired_at() {
        let job = job_with_variables(Map::new());
        assert!(!job.lease_expired_at(Utc::now()));
        assert!(job.lease_expired_at(job.deadline));
        assert!(job.lease_expired_at(job.deadline + ChronoDuration::seconds(1)));
    }
}
