//! gRPC service implementation.
//!
//! - [`handler`] - The `HashFinder` service entry point ([`HashFinderService`](handler::HashFinderService)).

pub mod handler;
