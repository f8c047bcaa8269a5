//! # Library-Internal Utilities

use std::time::{Duration, Instant};

/// Computes the number of binary digits needed to represent a number. Zero
/// still takes one digit.
#[must_use]
pub(crate) fn digits(mut number: u64) -> usize {
    if number == 0 {
        return 1;
    }
    let mut digits = 0;
    while number > 0 {
        digits += 1;
        number >>= 1;
    }
    digits
}

/// A wall-clock budget shared between encoding and solving
#[derive(Debug, Clone, Copy)]
pub(crate) struct Budget {
    start: Instant,
    total: Duration,
}

impl Budget {
    /// Starts the clock on a budget of `total`
    pub fn start(total: Duration) -> Self {
        Self {
            start: Instant::now(),
            total,
        }
    }

    /// The time spent since the budget was started
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// The time left, saturating at zero
    pub fn remaining(&self) -> Duration {
        self.total.saturating_sub(self.start.elapsed())
    }

    /// Whether the budget is used up
    pub fn exhausted(&self) -> bool {
        self.remaining().is_zero()
    }
}
