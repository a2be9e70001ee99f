//! Procflow Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/gRPC
//! - The async runtime
//!
//! All types here describe jobs claimed from a remote process engine and the
//! policies applied while working on them.

pub mod backoff;
pub mod error;
pub mod ids;
pub mod job;
pub mod lease;
pub mod outcome;

// Re-export commonly used types
pub use backoff::BackoffPolicy;
pub use error::VariableError;
pub use ids::JobKey;
pub use job::{ActivationRequest, Job};
pub use lease::LeaseClock;
pub use outcome::JobOutcome;
