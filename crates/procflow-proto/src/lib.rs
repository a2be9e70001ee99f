//! Wire types and gRPC client for the `procflow.gateway.v1` protocol.
//!
//! This crate contains:
//! - Protobuf message types for the gateway's job surface
//! - The gRPC client stub for the Gateway service
//! - Converters between wire types and domain types
//!
//! The message and service definitions are maintained by hand against the
//! protocol, so the workspace builds without a protoc toolchain.

pub mod convert;
pub mod pb;

// Re-export commonly used types
pub use convert::ConvertError;
pub use pb::gateway_client::GatewayClient;
