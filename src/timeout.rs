// Copyright (c) 2025 RustyDB Contributors
//
// Timeout encoding shared by every waitable API in this crate.

/// Microsecond timeout budget for a conditional acquisition.
///
/// Convention: negative means wait forever, zero means a single conditional
/// attempt with no waiting, positive is a deadline in microseconds.
pub type TimeoutMicros = i64;

/// Infinite wait.
pub const TIMEOUT_INFINITE: TimeoutMicros = -1;

/// Conditional, single-attempt acquisition.
pub const TIMEOUT_CONDITIONAL: TimeoutMicros = 0;

/// How a [`TimeoutMicros`] value should be interpreted by a waiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutKind {
    /// Block until the resource becomes available.
    Infinite,
    /// Try exactly once; do not wait at all.
    Conditional,
    /// Wait up to the given number of microseconds.
    Bounded(u64),
}

impl From<TimeoutMicros> for TimeoutKind {
    fn from(timeout: TimeoutMicros) -> Self {
        if timeout < 0 {
            TimeoutKind::Infinite
        } else if timeout == 0 {
            TimeoutKind::Conditional
        } else {
            TimeoutKind::Bounded(timeout as u64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_is_infinite() {
        assert_eq!(TimeoutKind::from(-1), TimeoutKind::Infinite);
        assert_eq!(TimeoutKind::from(-1_000_000), TimeoutKind::Infinite);
    }

    #[test]
    fn zero_is_conditional() {
        assert_eq!(TimeoutKind::from(0), TimeoutKind::Conditional);
    }

    #[test]
    fn positive_is_bounded_microseconds() {
        assert_eq!(TimeoutKind::from(1_000), TimeoutKind::Bounded(1_000));
    }
}
