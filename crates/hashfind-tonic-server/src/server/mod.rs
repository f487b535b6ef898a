//! Server side of the `HashFinder` gRPC service.
//!
//! - [`config`] - CLI and environment configuration.
//! - [`service`] - The tonic service that accepts calls.
//! - [`streaming`] - Work requests and the code that runs them.
//! - [`pool`] - Worker tasks and the pool that feeds them.
//! - [`telemetry`] - Logging, tracing and metrics.

pub mod config;
pub mod pool;
pub mod service;
pub mod streaming;
pub mod telemetry;
