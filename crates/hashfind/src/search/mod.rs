//! Candidate enumeration and the unbounded search built on top of it.
//!
//! - [`LengthEnumerator`] walks every candidate of one fixed length in
//!   ascending big-endian order.
//! - [`Search`] chains enumerators for lengths `max(1, target.len())`,
//!   `+1`, `+2`, ... into a single lazy sequence that only ends on a match
//!   within the ideal distance, on cancellation, or (when bounded with
//!   [`Search::with_max_length`]) once the last permitted length is
//!   exhausted.
//!
//! Both are plain [`Iterator`]s over `Result<SearchEvent>` and run entirely
//! on the calling thread. Cancellation is cooperative: the shared
//! [`CancelFlag`](crate::CancelFlag) is checked before every candidate, so at
//! most the candidate in flight completes after the flag is set.

mod driver;
mod enumerator;

pub use driver::*;
pub use enumerator::*;
