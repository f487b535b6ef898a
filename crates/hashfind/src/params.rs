/// Parameters of a single search. Immutable for the lifetime of the search.
///
/// `ideal_distance` is the threshold at or below which a match ends the
/// search. `interesting_distance`, when set, is a looser threshold at or below
/// which matches are reported while the search carries on. Nothing checks
/// that `ideal_distance <= interesting_distance`; callers that invert them get
/// exactly what the thresholds say.
///
/// # Example
///
/// ```
/// use hashfind::SearchParams;
///
/// let params = SearchParams::new("cat", 0).with_interesting_distance(1);
/// assert_eq!(params.target(), b"cat");
/// assert_eq!(params.interesting_distance(), Some(1));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SearchParams {
    target: Vec<u8>,
    ideal_distance: usize,
    interesting_distance: Option<usize>,
}

impl SearchParams {
    pub fn new(target: impl Into<Vec<u8>>, ideal_distance: usize) -> Self {
        Self {
            target: target.into(),
            ideal_distance,
            interesting_distance: None,
        }
    }

    pub fn with_interesting_distance(mut self, distance: usize) -> Self {
        self.interesting_distance = Some(distance);
        self
    }

    pub fn target(&self) -> &[u8] {
        &self.target
    }

    pub const fn ideal_distance(&self) -> usize {
        self.ideal_distance
    }

    pub const fn interesting_distance(&self) -> Option<usize> {
        self.interesting_distance
    }

    /// The shortest candidate length that can be compared against the target.
    pub fn min_length(&self) -> usize {
        self.target.len().max(1)
    }

    /// Classifies a candidate's distance against both thresholds.
    ///
    /// The ideal threshold takes precedence, so a match that satisfies both
    /// always ends the search.
    pub(crate) fn classify(&self, distance: usize) -> Verdict {
        if distance <= self.ideal_distance {
            Verdict::Ideal
        } else if self
            .interesting_distance
            .is_some_and(|interesting| distance <= interesting)
        {
            Verdict::Interesting
        } else {
            Verdict::Miss
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Verdict {
    Ideal,
    Interesting,
    Miss,
}
