/// A result type defaulting to the crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `hashfind` can emit.
///
/// Cancellation and exhaustion of the search space are *not* errors; they are
/// reported as an [`Outcome`](crate::Outcome). An error here means a
/// precondition was violated and the search was aborted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Two strings could not be compared, or a length was requested that no
    /// candidate can satisfy.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },
}

impl Error {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}
