//! Deadline-based debouncing for selection-change events.
//!
//! The host environment fires a burst of selection events while the
//! user clicks around. [`Debouncer`] coalesces them: every trigger
//! pushes the deadline out, and [`poll`](Debouncer::poll) reports `true`
//! exactly once after the environment has been quiet for the delay.
//!
//! Time is passed in explicitly so the logic stays testable; callers use
//! `web_time::Instant::now()`, which maps to `performance.now()` on WASM.

use std::time::Duration;

use web_time::Instant;

/// Trailing-edge debouncer driven by caller-supplied timestamps.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Record an event at `now`, (re)arming the deadline.
    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Arm the deadline with a one-off delay instead of the configured one.
    pub fn trigger_after(&mut self, now: Instant, delay: Duration) {
        self.deadline = Some(now + delay);
    }

    /// When the pending event fires, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns `true` (once) if the deadline has passed at `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(100);

    #[test]
    fn fires_once_after_delay() {
        let start = Instant::now();
        let mut d = Debouncer::new(DELAY);
        d.trigger(start);
        assert!(d.deadline().is_some());
        assert!(!d.poll(start + Duration::from_millis(99)));
        assert!(d.poll(start + DELAY));
        assert!(!d.poll(start + Duration::from_millis(500)));
        assert_eq!(d.deadline(), None);
    }

    #[test]
    fn burst_of_events_coalesces() {
        let start = Instant::now();
        let mut d = Debouncer::new(DELAY);
        for ms in [0, 30, 60, 90] {
            d.trigger(start + Duration::from_millis(ms));
        }
        // Quiet period is measured from the last event.
        assert!(!d.poll(start + Duration::from_millis(150)));
        assert!(d.poll(start + Duration::from_millis(190)));
    }

    #[test]
    fn idle_debouncer_never_fires() {
        let mut d = Debouncer::new(DELAY);
        assert!(!d.poll(Instant::now()));
        assert_eq!(d.deadline(), None);
    }

    #[test]
    fn one_off_delay_overrides_configured_delay() {
        let start = Instant::now();
        let mut d = Debouncer::new(DELAY);
        d.trigger_after(start, Duration::from_millis(500));
        assert!(!d.poll(start + DELAY));
        assert!(d.poll(start + Duration::from_millis(500)));
    }
}
