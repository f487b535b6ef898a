//! Work requests and their execution.
//!
//! - [`request`] - The messages a worker accepts.
//! - [`coordinator`] - Hands a call to the pool and collects its result.
//! - [`processor`] - Runs a search on a blocking thread inside a worker.
//! - [`stream`] - The response stream that cancels its search when dropped.

pub mod coordinator;
pub mod processor;
pub mod request;
pub mod stream;
