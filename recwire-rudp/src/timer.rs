//! One-shot retry timer.
//!
//! The engine arms one timer per attempt and feeds its remaining time into
//! the socket's read timeout, so a blocked receive wakes up when the
//! deadline passes. Re-arming is done by constructing a fresh timer;
//! [`RetryTimer::stop`] consumes the handle, so an armed alarm cannot leak
//! across attempts.

use std::time::{Duration, Instant};

/// A one-shot deadline bounding a blocking receive.
#[derive(Debug)]
pub struct RetryTimer {
    deadline: Instant,
}

impl RetryTimer {
    /// Arm the timer to expire after `duration`.
    pub fn start(duration: Duration) -> Self {
        Self {
            deadline: Instant::now() + duration,
        }
    }

    /// Whether the deadline has passed.
    #[inline]
    pub fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Time left until the deadline, or `None` once expired.
    ///
    /// Never returns a zero duration, so the result is always valid as a
    /// socket read timeout.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .checked_duration_since(Instant::now())
            .filter(|d| !d.is_zero())
    }

    /// Disarm the timer.
    #[inline]
    pub fn stop(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_timer_not_expired() {
        let timer = RetryTimer::start(Duration::from_secs(60));
        assert!(!timer.expired());
        assert!(timer.remaining().is_some());
    }

    #[test]
    fn test_timer_expires() {
        let timer = RetryTimer::start(Duration::from_millis(5));
        std::thread::sleep(Duration::from_millis(10));
        assert!(timer.expired());
        assert_eq!(timer.remaining(), None);
    }

    #[test]
    fn test_remaining_shrinks() {
        let timer = RetryTimer::start(Duration::from_millis(200));
        let first = timer.remaining().unwrap();
        std::thread::sleep(Duration::from_millis(20));
        let second = timer.remaining().unwrap();
        assert!(second < first);
    }

    #[test]
    fn test_remaining_never_zero() {
        let timer = RetryTimer::start(Duration::from_nanos(1));
        std::thread::sleep(Duration::from_millis(1));
        // Either expired (None) or a strictly positive remainder.
        if let Some(d) = timer.remaining() {
            assert!(!d.is_zero());
        }
    }
}
