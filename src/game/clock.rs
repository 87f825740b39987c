//! Turn Clock
//!
//! One deadline per turn. The clock starts when the active player first
//! interacts and stops on commit or elimination; cancelling a route or an
//! ability phase leaves it running. Time is always passed in.

use chrono::{DateTime, Duration, Utc};

/// Per-turn countdown.
#[derive(Clone, Debug)]
pub struct TurnClock {
    duration: Duration,
    deadline: Option<DateTime<Utc>>,
}

impl TurnClock {
    /// Clock with the given turn length, not running.
    pub fn new(duration: Duration) -> Self {
        Self { duration, deadline: None }
    }

    /// Turn length.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Start the countdown. No-op (returns false) while already running.
    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        if self.deadline.is_some() {
            return false;
        }
        self.deadline = Some(now + self.duration);
        true
    }

    /// Stop the countdown.
    pub fn clear(&mut self) {
        self.deadline = None;
    }

    /// Running?
    pub fn is_running(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Time left, clamped at zero. `None` while stopped.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.deadline.map(|d| (d - now).max(Duration::zero()))
    }

    /// Deadline reached.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_start_is_reentrant() {
        let mut clock = TurnClock::new(Duration::seconds(60));
        assert!(!clock.is_running());
        assert!(clock.start(t(0)));
        assert!(!clock.start(t(30)));
        assert_eq!(clock.deadline(), Some(t(60)));
    }

    #[test]
    fn test_remaining_and_expiry() {
        let mut clock = TurnClock::new(Duration::seconds(60));
        assert_eq!(clock.remaining(t(0)), None);
        assert!(!clock.is_expired(t(1000)));

        clock.start(t(0));
        assert_eq!(clock.remaining(t(45)), Some(Duration::seconds(15)));
        assert!(!clock.is_expired(t(59)));
        assert!(clock.is_expired(t(60)));
        assert_eq!(clock.remaining(t(90)), Some(Duration::zero()));

        clock.clear();
        assert!(!clock.is_expired(t(90)));
    }
}
