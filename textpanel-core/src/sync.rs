//! Refresh counter
//!
//! The engine bumps the counter once per complete content sweep (every
//! cell of both rows has gone out on the wire). Writers use it to wait
//! until their text is visible.

use portable_atomic::{AtomicU8, Ordering};

/// Wrapping 8-bit count of completed content sweeps
#[derive(Debug)]
pub struct RefreshCounter {
    count: AtomicU8,
}

impl Default for RefreshCounter {
    fn default() -> Self {
        Self::new(0)
    }
}

impl RefreshCounter {
    /// Create a counter starting at `start`
    pub const fn new(start: u8) -> Self {
        Self {
            count: AtomicU8::new(start),
        }
    }

    /// Current count
    pub fn get(&self) -> u8 {
        self.count.load(Ordering::Acquire)
    }

    /// Sweeps completed since the count was `start`, modulo 256
    pub fn elapsed_since(&self, start: u8) -> u8 {
        self.get().wrapping_sub(start)
    }

    /// Record one completed sweep
    ///
    /// Only the engine calls this; it is the single writer.
    pub(crate) fn advance(&self) {
        // Single writer: load/store is enough, and works on cores without CAS
        let next = self.count.load(Ordering::Relaxed).wrapping_add(1);
        self.count.store(next, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_wraps() {
        let counter = RefreshCounter::new(255);
        counter.advance();
        assert_eq!(counter.get(), 0);
        assert_eq!(counter.elapsed_since(255), 1);
    }

    proptest! {
        #[test]
        fn elapsed_counts_advances(start in any::<u8>(), steps in 0u8..200) {
            let counter = RefreshCounter::new(start);
            for _ in 0..steps {
                counter.advance();
            }
            prop_assert_eq!(counter.elapsed_since(start), steps);
        }
    }
}
