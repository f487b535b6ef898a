#![doc = include_str!("../README.md")]

mod common;
pub use common::*;
// Public re-export so downstream crates can access `hashfind` via
// `hashfind_tonic_core::hashfind`
pub use hashfind;
