//! Worker tasks and the pool that distributes searches across them.
//!
//! - [`manager`] - Round-robin dispatch, admission and phased shutdown.
//! - [`worker`] - The loop each worker task runs.

pub mod manager;
pub mod worker;
