use crate::{Error, Result};

/// Counts the positions at which `a` and `b` differ, ignoring ASCII case.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the inputs have different lengths.
///
/// # Example
///
/// ```
/// use hashfind::hamming_distance;
///
/// assert_eq!(hamming_distance(b"Karolin", b"kathrin").unwrap(), 3);
/// assert_eq!(hamming_distance(b"ABC", b"abc").unwrap(), 0);
/// ```
pub fn hamming_distance(a: &[u8], b: &[u8]) -> Result<usize> {
    if a.len() != b.len() {
        return Err(Error::invalid_input(format!(
            "cannot compare strings of length {} and {}",
            a.len(),
            b.len()
        )));
    }
    Ok(mismatches(a, b))
}

/// Returns the smallest [`hamming_distance`] between `target` and any window
/// of `candidate` with the same length as `target`.
///
/// Every one of the `candidate.len() - target.len() + 1` windows is compared
/// exactly once.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if `candidate` is empty or shorter than
/// `target`.
///
/// # Example
///
/// ```
/// use hashfind::min_substring_hamming_distance;
///
/// let d = min_substring_hamming_distance(b"xxHixx", b"hi").unwrap();
/// assert_eq!(d, 0);
/// ```
pub fn min_substring_hamming_distance(candidate: &[u8], target: &[u8]) -> Result<usize> {
    if candidate.is_empty() {
        return Err(Error::invalid_input("candidate must not be empty"));
    }
    if target.len() > candidate.len() {
        return Err(Error::invalid_input(format!(
            "target of length {} is longer than candidate of length {}",
            target.len(),
            candidate.len()
        )));
    }

    // Lengths are checked once above, so each window goes straight to the
    // infallible comparison.
    let min = candidate
        .windows(target.len().max(1))
        .map(|window| mismatches(&window[..target.len()], target))
        .min()
        .unwrap_or(0);
    Ok(min)
}

#[inline]
fn mismatches(a: &[u8], b: &[u8]) -> usize {
    a.iter()
        .zip(b)
        .filter(|(x, y)| !x.eq_ignore_ascii_case(y))
        .count()
}
