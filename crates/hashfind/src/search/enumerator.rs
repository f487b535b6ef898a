use crate::{
    CancelFlag, Candidate, Error, Match, Outcome, Result, SearchEvent, SearchParams,
    SecretHasher, min_substring_hamming_distance, params::Verdict,
};
use core::iter::FusedIterator;

/// Enumerates every candidate of exactly one length.
///
/// Produces the matches for that length in ascending candidate order followed
/// by exactly one [`SearchEvent::Finished`]:
///
/// - [`Outcome::Found`] right after a match within the ideal distance,
/// - [`Outcome::Exhausted`] after the all-`0xff` candidate was evaluated,
/// - [`Outcome::Cancelled`] when the flag was set before the next candidate.
///
/// A digest that cannot be compared against the target (shorter than it, or
/// empty) yields a single `Err` instead and ends the enumeration.
#[derive(Debug)]
pub struct LengthEnumerator<H> {
    params: SearchParams,
    hasher: H,
    flag: CancelFlag,
    candidate: Candidate,
    state: State,
    evaluated: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Running,
    /// A match was just yielded; the outcome is still owed.
    Finishing(Outcome),
    Done,
}

impl<H: SecretHasher> LengthEnumerator<H> {
    /// Creates an enumerator over candidates of `length` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `length` is zero or shorter than the
    /// target.
    pub fn new(params: SearchParams, hasher: H, flag: CancelFlag, length: usize) -> Result<Self> {
        if length == 0 {
            return Err(Error::invalid_input("candidate length must be at least 1"));
        }
        if length < params.target().len() {
            return Err(Error::invalid_input(format!(
                "candidate length {length} is shorter than target length {}",
                params.target().len()
            )));
        }
        Ok(Self::starting_at(params, hasher, flag, length))
    }

    /// Creates an enumerator without re-checking `length`; callers guarantee
    /// `length >= params.min_length()`.
    pub(crate) fn starting_at(
        params: SearchParams,
        hasher: H,
        flag: CancelFlag,
        length: usize,
    ) -> Self {
        Self {
            params,
            hasher,
            flag,
            candidate: Candidate::zeroed(length),
            state: State::Running,
            evaluated: 0,
        }
    }

    /// Restarts at the first candidate of a longer `length`, keeping the
    /// evaluation count.
    pub(crate) fn restart(&mut self, length: usize) {
        debug_assert!(length >= self.params.min_length());
        self.candidate = Candidate::zeroed(length);
        self.state = State::Running;
    }

    /// The candidate length being enumerated.
    pub fn length(&self) -> usize {
        self.candidate.len()
    }

    /// Total number of candidates hashed so far.
    pub const fn candidates_evaluated(&self) -> u64 {
        self.evaluated
    }

    pub const fn params(&self) -> &SearchParams {
        &self.params
    }

    fn step(&mut self) -> Option<Result<SearchEvent>> {
        loop {
            if self.flag.is_cancelled() {
                self.state = State::Done;
                return Some(Ok(SearchEvent::Finished(Outcome::Cancelled)));
            }

            let secret = self.candidate.as_bytes();
            let digest = self.hasher.hash(secret);
            self.evaluated += 1;

            let distance =
                match min_substring_hamming_distance(digest.as_bytes(), self.params.target()) {
                    Ok(distance) => distance,
                    Err(e) => {
                        self.state = State::Done;
                        return Some(Err(e));
                    }
                };

            let verdict = self.params.classify(distance);
            let found = (verdict != Verdict::Miss).then(|| Match {
                secret: secret.to_vec(),
                digest,
                distance,
            });
            let more = self.candidate.advance();

            match (verdict, found) {
                (Verdict::Ideal, Some(m)) => {
                    self.state = State::Finishing(Outcome::Found);
                    return Some(Ok(SearchEvent::Match(m)));
                }
                (Verdict::Interesting, Some(m)) => {
                    if !more {
                        self.state = State::Finishing(Outcome::Exhausted);
                    }
                    return Some(Ok(SearchEvent::Match(m)));
                }
                _ if !more => {
                    self.state = State::Done;
                    return Some(Ok(SearchEvent::Finished(Outcome::Exhausted)));
                }
                _ => {}
            }
        }
    }
}

impl<H: SecretHasher> Iterator for LengthEnumerator<H> {
    type Item = Result<SearchEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            State::Running => self.step(),
            State::Finishing(outcome) => {
                self.state = State::Done;
                Some(Ok(SearchEvent::Finished(outcome)))
            }
            State::Done => None,
        }
    }
}

impl<H: SecretHasher> FusedIterator for LengthEnumerator<H> {}
