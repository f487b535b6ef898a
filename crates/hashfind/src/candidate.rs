/// A fixed-length byte string that counts through every value of its length.
///
/// The digits are interpreted as a big-endian base-256 integer: the counter
/// starts at all zeros and [`Candidate::advance`] visits each value exactly
/// once in ascending order until every digit is `0xff`.
///
/// # Example
///
/// ```
/// use hashfind::Candidate;
///
/// let mut c = Candidate::zeroed(2);
/// assert_eq!(c.as_bytes(), &[0, 0]);
/// assert!(c.advance());
/// assert_eq!(c.as_bytes(), &[0, 1]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Candidate {
    digits: Vec<u8>,
}

impl Candidate {
    /// Creates the smallest candidate of `len` bytes.
    pub fn zeroed(len: usize) -> Self {
        Self {
            digits: vec![0; len],
        }
    }

    /// Number of bytes in the candidate.
    pub fn len(&self) -> usize {
        self.digits.len()
    }

    /// Returns `true` for the zero-length candidate.
    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.digits
    }

    /// Steps to the next value, carrying from the last digit leftward.
    ///
    /// Returns `false`, leaving every digit wrapped to zero, when the carry
    /// runs past the most significant digit, i.e. when the length is
    /// exhausted.
    pub fn advance(&mut self) -> bool {
        for digit in self.digits.iter_mut().rev() {
            let (next, carry) = digit.overflowing_add(1);
            *digit = next;
            if !carry {
                return true;
            }
        }
        false
    }
}

impl AsRef<[u8]> for Candidate {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_index(bytes: &[u8]) -> u64 {
        bytes.iter().fold(0, |acc, &b| (acc << 8) | u64::from(b))
    }

    #[test]
    fn carries_into_higher_digits() {
        let mut c = Candidate::zeroed(3);
        for _ in 0..255 {
            assert!(c.advance());
        }
        assert_eq!(c.as_bytes(), &[0, 0, 255]);
        assert!(c.advance());
        assert_eq!(c.as_bytes(), &[0, 1, 0]);
    }

    #[test]
    fn visits_every_value_in_ascending_order() {
        let mut c = Candidate::zeroed(2);
        let mut expected = 0;
        loop {
            assert_eq!(as_index(c.as_bytes()), expected);
            expected += 1;
            if !c.advance() {
                break;
            }
        }
        assert_eq!(expected, 256 * 256);
        assert_eq!(c.as_bytes(), &[0, 0]);
    }

    #[test]
    fn single_byte_exhausts_after_256_values() {
        let mut c = Candidate::zeroed(1);
        let steps = core::iter::from_fn(|| c.advance().then_some(())).count();
        assert_eq!(steps, 255);
    }

    #[test]
    fn empty_candidate_is_immediately_exhausted() {
        let mut c = Candidate::zeroed(0);
        assert!(c.is_empty());
        assert!(!c.advance());
    }
}
