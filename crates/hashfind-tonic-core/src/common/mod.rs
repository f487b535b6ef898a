//! Protocol bindings, shared types, and the service error type.
//!
//! - [`proto`] - Generated `HashFinder` service and message definitions.
//! - [`types`] - The hasher the service runs with and conversions between
//!   wire messages and [`hashfind`] types.
//! - [`error`] - [`Error`] and its mapping onto [`tonic::Status`].

pub mod error;
pub mod proto;
pub mod types;

pub use error::{Error, Result};
