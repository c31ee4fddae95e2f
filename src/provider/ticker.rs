//! Fixed-cadence tick scheduling.

use std::time::{Duration, Instant};

/// Fixed-interval schedule without catch-up bursts.
///
/// A late tick pushes the schedule forward instead of firing the missed
/// ticks back to back.
#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    next: Instant,
}

impl Ticker {
    /// First tick is due immediately.
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next: now,
        }
    }

    pub fn due(&self, now: Instant) -> bool {
        now >= self.next
    }

    /// Time left until the next tick; zero when due.
    pub fn time_until(&self, now: Instant) -> Duration {
        self.next.saturating_duration_since(now)
    }

    /// Marks the current tick as consumed.
    pub fn advance(&mut self, now: Instant) {
        self.next += self.interval;
        if self.next <= now {
            self.next = now + self.interval;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_is_immediate() {
        let now = Instant::now();
        let t = Ticker::new(Duration::from_secs(5), now);
        assert!(t.due(now));
        assert_eq!(t.time_until(now), Duration::ZERO);
    }

    #[test]
    fn keeps_fixed_cadence() {
        let t0 = Instant::now();
        let mut t = Ticker::new(Duration::from_secs(5), t0);
        // Cycle took 1s.
        t.advance(t0 + Duration::from_secs(1));
        assert!(!t.due(t0 + Duration::from_secs(4)));
        assert!(t.due(t0 + Duration::from_secs(5)));
        assert_eq!(
            t.time_until(t0 + Duration::from_secs(2)),
            Duration::from_secs(3)
        );
    }

    #[test]
    fn late_tick_does_not_burst() {
        let t0 = Instant::now();
        let mut t = Ticker::new(Duration::from_secs(5), t0);
        // Cycle overran by three intervals.
        let late = t0 + Duration::from_secs(17);
        t.advance(late);
        assert!(!t.due(late));
        assert_eq!(t.time_until(late), Duration::from_secs(5));
    }
}
