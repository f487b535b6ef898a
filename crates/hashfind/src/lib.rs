#![doc = include_str!("../README.md")]

mod cancel;
mod candidate;
mod digest;
mod distance;
mod error;
mod params;
mod search;
mod status;

pub use crate::cancel::*;
pub use crate::candidate::*;
pub use crate::digest::*;
pub use crate::distance::*;
pub use crate::error::*;
pub use crate::params::*;
pub use crate::search::*;
pub use crate::status::*;
