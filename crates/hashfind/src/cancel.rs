use portable_atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A per-search stop latch shared between the owner of a call and the
/// enumeration loop running on its behalf.
///
/// The flag starts cleared and can only ever transition to set. Clones share
/// the same latch, so the owner keeps one handle and hands another to the
/// search. Setting the flag does not interrupt a candidate that is already
/// being evaluated; the search observes it before evaluating the next one.
///
/// # Example
///
/// ```
/// use hashfind::CancelFlag;
///
/// let flag = CancelFlag::new();
/// let reader = flag.clone();
///
/// assert!(!reader.is_cancelled());
/// assert!(flag.cancel());
/// assert!(!flag.cancel()); // already set
/// assert!(reader.is_cancelled());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CancelFlag {
    inner: Arc<AtomicBool>,
}

impl CancelFlag {
    /// Creates a new, cleared flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flag.
    ///
    /// Returns `true` if this call performed the transition and `false` if
    /// the flag was already set. Calling it any number of times has the same
    /// observable effect as calling it once.
    pub fn cancel(&self) -> bool {
        !self.inner.swap(true, Ordering::AcqRel)
    }

    /// Returns `true` once [`Self::cancel`] has been called on any clone.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::Acquire)
    }

    /// Returns a guard that sets the flag when it is dropped.
    ///
    /// Tie the guard to whatever represents the lifetime of a call (a request
    /// future, a response stream) and the search stops as soon as that call
    /// ends, whether it completed, was abandoned by the caller, or timed out.
    pub fn drop_guard(&self) -> CancelOnDrop {
        CancelOnDrop { flag: self.clone() }
    }
}

/// Sets a [`CancelFlag`] when dropped. Created by [`CancelFlag::drop_guard`].
#[derive(Debug)]
#[must_use = "the flag is set as soon as the guard is dropped"]
pub struct CancelOnDrop {
    flag: CancelFlag,
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.flag.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_is_monotonic_and_idempotent() {
        let flag = CancelFlag::new();
        assert!(!flag.is_cancelled());
        assert!(flag.cancel());
        assert!(flag.is_cancelled());
        assert!(!flag.cancel());
        assert!(flag.is_cancelled());
    }

    #[test]
    fn clones_share_the_latch() {
        let owner = CancelFlag::new();
        let readers: Vec<_> = (0..4).map(|_| owner.clone()).collect();
        owner.cancel();
        assert!(readers.iter().all(CancelFlag::is_cancelled));
    }

    #[test]
    fn independent_flags_do_not_interfere() {
        let a = CancelFlag::new();
        let b = CancelFlag::new();
        a.cancel();
        assert!(!b.is_cancelled());
    }

    #[test]
    fn guard_sets_flag_on_drop() {
        let flag = CancelFlag::new();
        {
            let _guard = flag.drop_guard();
            assert!(!flag.is_cancelled());
        }
        assert!(flag.is_cancelled());
    }

    #[test]
    fn guard_on_already_cancelled_flag_is_harmless() {
        let flag = CancelFlag::new();
        let guard = flag.drop_guard();
        assert!(flag.cancel());
        drop(guard);
        assert!(flag.is_cancelled());
        assert!(!flag.cancel());
    }

    #[test]
    fn cancel_is_visible_across_threads() {
        let flag = CancelFlag::new();
        let reader = flag.clone();
        let handle = std::thread::spawn(move || {
            while !reader.is_cancelled() {
                std::thread::yield_now();
            }
        });
        flag.cancel();
        handle.join().unwrap();
    }
}
