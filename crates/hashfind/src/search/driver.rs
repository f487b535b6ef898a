use crate::{
    CancelFlag, Completion, LengthEnumerator, Outcome, Result, SearchEvent, SearchParams,
    SecretHasher,
};
use core::iter::FusedIterator;

/// The unbounded search: every candidate of length `max(1, target.len())`,
/// then every candidate one byte longer, and so on.
///
/// Matches from each length are passed through in order. An
/// [`Outcome::Exhausted`] from a length is swallowed and the next length is
/// started, so the sequence only finishes with [`Outcome::Found`] or
/// [`Outcome::Cancelled`], unless a maximum length was set with
/// [`Search::with_max_length`].
///
/// # Example
///
/// ```
/// use hashfind::{CancelFlag, Outcome, Search, SearchParams, Sha1Base64};
///
/// let completion = Search::new(SearchParams::new("Hi", 0), Sha1Base64, CancelFlag::new())
///     .best()
///     .unwrap();
///
/// assert_eq!(completion.outcome, Outcome::Found);
/// let best = completion.best.unwrap();
/// assert_eq!(best.secret, [0, 12]);
/// assert_eq!(best.digest, "X3ft/TkEIFpHiWOVYl3QWKmWnXg=");
/// ```
#[derive(Debug)]
pub struct Search<H> {
    enumerator: LengthEnumerator<H>,
    max_length: Option<usize>,
    state: State,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Running,
    Finished(Outcome),
    Failed,
}

impl<H: SecretHasher> Search<H> {
    pub fn new(params: SearchParams, hasher: H, flag: CancelFlag) -> Self {
        let length = params.min_length();
        #[cfg(feature = "tracing")]
        tracing::debug!("Checking strings of length {length}");
        Self {
            enumerator: LengthEnumerator::starting_at(params, hasher, flag, length),
            max_length: None,
            state: State::Running,
        }
    }

    /// Bounds the search to candidates of at most `max_length` bytes. Once
    /// that length is exhausted the search finishes with
    /// [`Outcome::Exhausted`].
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// The length of the candidates currently being evaluated.
    pub fn current_length(&self) -> usize {
        self.enumerator.length()
    }

    /// Total number of candidates hashed across all lengths.
    pub const fn candidates_evaluated(&self) -> u64 {
        self.enumerator.candidates_evaluated()
    }

    /// The terminal outcome once the search has finished.
    pub const fn outcome(&self) -> Option<Outcome> {
        match self.state {
            State::Finished(outcome) => Some(outcome),
            State::Running | State::Failed => None,
        }
    }

    /// Runs the search to its end, keeping only the most recent match.
    ///
    /// Blocks the calling thread for as long as the search runs, which is
    /// forever unless a match within the ideal distance exists, the flag is
    /// set, or the search is bounded.
    ///
    /// # Errors
    ///
    /// Propagates [`Error::InvalidInput`](crate::Error::InvalidInput) from the
    /// distance computation.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all))]
    pub fn best(&mut self) -> Result<Completion> {
        let mut best = None;
        while let Some(event) = self.next() {
            match event? {
                SearchEvent::Match(m) => best = Some(m),
                SearchEvent::Finished(outcome) => return Ok(Completion { best, outcome }),
            }
        }
        // Only reachable when the search had already finished before `best`.
        Ok(Completion {
            best,
            outcome: self.outcome().unwrap_or(Outcome::Exhausted),
        })
    }

    fn finish(&mut self, outcome: Outcome) -> Option<Result<SearchEvent>> {
        self.state = State::Finished(outcome);
        Some(Ok(SearchEvent::Finished(outcome)))
    }

    fn beyond_max_length(&self, length: usize) -> bool {
        self.max_length.is_some_and(|max| length > max)
    }
}

impl<H: SecretHasher> Iterator for Search<H> {
    type Item = Result<SearchEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state != State::Running {
            return None;
        }
        if self.beyond_max_length(self.enumerator.length()) {
            return self.finish(Outcome::Exhausted);
        }

        loop {
            match self.enumerator.next() {
                Some(Ok(SearchEvent::Finished(Outcome::Exhausted))) => {
                    let next = self.enumerator.length().checked_add(1);
                    match next.filter(|&length| !self.beyond_max_length(length)) {
                        Some(length) => {
                            #[cfg(feature = "tracing")]
                            tracing::debug!("Incrementing length to {length}");
                            self.enumerator.restart(length);
                        }
                        None => return self.finish(Outcome::Exhausted),
                    }
                }
                Some(Ok(SearchEvent::Finished(outcome))) => return self.finish(outcome),
                Some(Ok(event)) => return Some(Ok(event)),
                Some(Err(e)) => {
                    self.state = State::Failed;
                    return Some(Err(e));
                }
                // The enumerator always reports an outcome before it ends.
                None => return self.finish(Outcome::Exhausted),
            }
        }
    }
}

impl<H: SecretHasher> FusedIterator for Search<H> {}
