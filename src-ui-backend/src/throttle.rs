//! Leading-edge throttle with a trailing value.
//!
//! The first value offered after a quiet period is emitted at once; values
//! offered inside the interval replace each other and the latest one is
//! released by [`Throttle::poll`] once the interval has elapsed. Time is
//! passed in by the caller so the same state machine runs under an event
//! loop, a tokio interval or a test clock.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Throttle<T> {
    interval: Duration,
    last_emit: Option<Instant>,
    pending: Option<T>,
}

impl<T> Throttle<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emit: None,
            pending: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn ready(&self, now: Instant) -> bool {
        self.last_emit
            .map_or(true, |last| now.duration_since(last) >= self.interval)
    }

    /// Offer a value; returns it when it may be emitted right away.
    pub fn offer(&mut self, value: T, now: Instant) -> Option<T> {
        if self.ready(now) {
            self.last_emit = Some(now);
            self.pending = None;
            Some(value)
        } else {
            self.pending = Some(value);
            None
        }
    }

    /// Release the trailing value if its interval has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.pending.is_some() && self.ready(now) {
            self.last_emit = Some(now);
            self.pending.take()
        } else {
            None
        }
    }

    /// When the pending value becomes due, if there is one.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (&self.pending, self.last_emit) {
            (Some(_), Some(last)) => Some(last + self.interval),
            _ => None,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the pending value and forget the last emission.
    pub fn reset(&mut self) {
        self.last_emit = None;
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(100);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_first_value_is_emitted_immediately() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(INTERVAL);
        assert_eq!(throttle.offer(1, t0), Some(1));
        assert!(!throttle.has_pending());
    }

    #[test]
    fn test_values_inside_interval_are_held() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(INTERVAL);
        assert_eq!(throttle.offer(1, t0), Some(1));
        assert_eq!(throttle.offer(2, t0 + ms(20)), None);
        assert_eq!(throttle.offer(3, t0 + ms(40)), None);
        assert_eq!(throttle.next_deadline(), Some(t0 + INTERVAL));

        // not yet due
        assert_eq!(throttle.poll(t0 + ms(99)), None);
        // the latest value wins
        assert_eq!(throttle.poll(t0 + ms(100)), Some(3));
        assert_eq!(throttle.poll(t0 + ms(300)), None);
    }

    #[test]
    fn test_offer_after_interval_emits() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(INTERVAL);
        throttle.offer(1, t0);
        throttle.offer(2, t0 + ms(50));
        assert_eq!(throttle.offer(3, t0 + ms(150)), Some(3));
        // the held value was superseded
        assert!(!throttle.has_pending());
    }

    #[test]
    fn test_reset_forgets_state() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(INTERVAL);
        throttle.offer(1, t0);
        throttle.offer(2, t0 + ms(10));
        throttle.reset();
        assert_eq!(throttle.next_deadline(), None);
        assert_eq!(throttle.offer(5, t0 + ms(20)), Some(5));
    }
}
