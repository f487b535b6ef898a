/// A candidate whose digest came within a requested distance of the target.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Match {
    /// The raw candidate bytes.
    pub secret: Vec<u8>,
    /// The text-encoded digest of `secret`.
    pub digest: String,
    /// The best substring Hamming distance between `digest` and the target.
    pub distance: usize,
}

/// How a search, or one length of it, came to an end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// A candidate within the ideal distance was found. It is always the
    /// match emitted immediately before this outcome.
    Found,
    /// Every candidate in the search space was evaluated without reaching the
    /// ideal distance.
    Exhausted,
    /// The [`CancelFlag`](crate::CancelFlag) was observed before the next
    /// candidate was evaluated.
    Cancelled,
}

/// One item produced by a search.
///
/// A search yields any number of [`SearchEvent::Match`] items followed by
/// exactly one [`SearchEvent::Finished`], after which it yields nothing.
///
/// # Example
///
/// ```
/// use hashfind::{CancelFlag, Outcome, Search, SearchEvent, SearchParams};
///
/// // Hex of the last byte; the two-character target starts the search at
/// // two-byte candidates.
/// let hasher = |secret: &[u8]| format!("{:02x}", secret[secret.len() - 1]);
/// let params = SearchParams::new("0a", 0);
/// let events: Vec<_> = Search::new(params, hasher, CancelFlag::new())
///     .collect::<Result<_, _>>()
///     .unwrap();
///
/// assert!(matches!(&events[0], SearchEvent::Match(m) if m.secret == [0, 10]));
/// assert_eq!(events[1], SearchEvent::Finished(Outcome::Found));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SearchEvent {
    Match(Match),
    Finished(Outcome),
}

impl SearchEvent {
    /// Returns the terminal outcome, or `None` for a match.
    pub const fn outcome(&self) -> Option<Outcome> {
        match self {
            Self::Match(_) => None,
            Self::Finished(outcome) => Some(*outcome),
        }
    }
}

/// The result of draining a search down to its most recent match.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Completion {
    /// The last match produced, or `None` if the search never produced one
    /// (for example when it was cancelled before the first candidate).
    pub best: Option<Match>,
    pub outcome: Outcome,
}
