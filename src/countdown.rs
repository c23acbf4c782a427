use std::time::Duration;

/// How often a running countdown must be ticked.
pub const TICK: Duration = Duration::from_secs(1);

/// Whole-second countdown, advanced by one recurring timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Countdown {
    remaining: u64,
}

impl Countdown {
    /// Anything shorter than one tick still lasts one tick.
    pub fn start(duration: Duration) -> Self {
        Self { remaining: duration.as_secs().max(1) }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Returns true once the countdown has run out.
    pub fn tick(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.expired()
    }

    pub fn expired(&self) -> bool {
        self.remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_to_expiry() {
        let mut countdown = Countdown::start(Duration::from_secs(3));
        assert_eq!(countdown.remaining(), 3);
        assert!(!countdown.tick());
        assert_eq!(countdown.remaining(), 2);
        assert!(!countdown.tick());
        assert!(countdown.tick());
        assert!(countdown.expired());

        // Stays expired.
        assert!(countdown.tick());
        assert_eq!(countdown.remaining(), 0);
    }

    #[test]
    fn sub_second_duration() {
        let mut countdown = Countdown::start(Duration::from_millis(300));
        assert_eq!(countdown.remaining(), 1);
        assert!(countdown.tick());
    }
}
