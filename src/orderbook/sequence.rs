//! Sequence continuity checks for the delta stream.
//!
//! Every delta names the sequence number it follows (`prevSeqNum`). A delta
//! is only applied when that matches the last sequence number we applied;
//! anything else means frames were lost and the book can no longer be
//! trusted. Gaps are never repaired locally: the remote is asked for a
//! fresh baseline instead.

/// Result of checking a delta against the recorded sequence number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceCheck {
    /// Delta continues the stream (or is the first one seen)
    Continuous,
    /// Delta does not follow the last applied frame
    Gap {
        /// Sequence number the delta should have named as its predecessor
        expected: u64,
        /// Predecessor the delta actually named
        received: Option<u64>,
    },
}

impl SequenceCheck {
    /// Check if the delta may be applied
    #[must_use]
    pub const fn is_continuous(&self) -> bool {
        matches!(self, SequenceCheck::Continuous)
    }
}

/// Tracks the last applied sequence number
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceGuard {
    last: Option<u64>,
}

impl SequenceGuard {
    /// Create a guard that has not seen any frame yet
    #[must_use]
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Last applied sequence number, `None` before the first frame
    #[must_use]
    pub const fn last(&self) -> Option<u64> {
        self.last
    }

    /// Check a delta's predecessor against the recorded sequence number
    ///
    /// The first frame is always accepted.
    #[must_use]
    pub fn check(&self, prev_seq_num: Option<u64>) -> SequenceCheck {
        match self.last {
            None => SequenceCheck::Continuous,
            Some(last) if prev_seq_num == Some(last) => SequenceCheck::Continuous,
            Some(last) => SequenceCheck::Gap {
                expected: last,
                received: prev_seq_num,
            },
        }
    }

    /// Record a sequence number as applied
    pub fn adopt(&mut self, seq_num: u64) {
        self.last = Some(seq_num);
    }

    /// Forget the recorded sequence number
    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_frame_accepted() {
        let guard = SequenceGuard::new();
        assert_eq!(guard.check(None), SequenceCheck::Continuous);
        assert_eq!(guard.check(Some(41)), SequenceCheck::Continuous);
    }

    #[test]
    fn test_continuous_and_gap() {
        let mut guard = SequenceGuard::new();
        guard.adopt(10);

        assert!(guard.check(Some(10)).is_continuous());
        assert_eq!(
            guard.check(Some(12)),
            SequenceCheck::Gap {
                expected: 10,
                received: Some(12)
            }
        );
        assert_eq!(
            guard.check(None),
            SequenceCheck::Gap {
                expected: 10,
                received: None
            }
        );
        // Checking never moves the recorded number
        assert_eq!(guard.last(), Some(10));
    }

    #[test]
    fn test_reset() {
        let mut guard = SequenceGuard::new();
        guard.adopt(3);
        guard.reset();
        assert_eq!(guard.last(), None);
        assert!(guard.check(Some(99)).is_continuous());
    }
}
