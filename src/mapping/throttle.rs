//! Leading/trailing-edge throttle for publish calls
//!
//! The first call after a quiet period runs immediately. Calls that arrive while the
//! interval is still running overwrite a single pending slot; [`Throttle::flush`]
//! delivers that slot once the interval has elapsed. The callback is passed on every
//! call, so whatever closure the caller holds at that moment is the one that runs.
//!
//! ```text
//! call ─► fired? ──no──► run now, stamp last_fired
//!            │
//!           yes, inside interval ─► pending = latest args ─► flush(now >= deadline) ─► run
//! ```

use std::time::{Duration, Instant};
use tracing::{debug, trace};

#[derive(Debug)]
pub struct Throttle<A> {
    interval: Duration,
    last_fired: Option<Instant>,
    pending: Option<A>,
}

impl<A> Throttle<A> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fired: None,
            pending: None,
        }
    }

    /// Interval for a publish rate given in Hz
    pub fn interval_for_rate(rate_hz: f64) -> Duration {
        if rate_hz.is_finite() && rate_hz > 0.0 {
            Duration::from_secs_f64(1.0 / rate_hz)
        } else {
            Duration::from_secs(1)
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration) {
        if interval != self.interval {
            debug!("Throttle interval changed to {:?}", interval);
            self.interval = interval;
        }
    }

    /// Runs `f` right away on the leading edge, otherwise parks `args` for the trailing edge.
    ///
    /// Returns `true` if `f` was invoked.
    pub fn call<F: FnOnce(A)>(&mut self, now: Instant, args: A, f: F) -> bool {
        match self.last_fired {
            Some(last) if now.saturating_duration_since(last) < self.interval => {
                trace!("Throttled call parked for trailing edge");
                self.pending = Some(args);
                false
            }
            _ => {
                self.last_fired = Some(now);
                self.pending = None;
                f(args);
                true
            }
        }
    }

    /// Delivers the parked call if its deadline has passed.
    pub fn flush<F: FnOnce(A)>(&mut self, now: Instant, f: F) -> bool {
        let due = match self.next_deadline() {
            Some(deadline) => now >= deadline,
            None => false,
        };
        if !due {
            return false;
        }
        match self.pending.take() {
            Some(args) => {
                self.last_fired = Some(now);
                f(args);
                true
            }
            None => false,
        }
    }

    /// When the parked call becomes due, if there is one
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref()?;
        Some(match self.last_fired {
            Some(last) => last + self.interval,
            None => Instant::now(),
        })
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drops the parked call without running it.
    pub fn cancel(&mut self) -> Option<A> {
        let dropped = self.pending.take();
        if dropped.is_some() {
            debug!("Pending throttled call cancelled");
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_first_call_runs_immediately() {
        let mut throttle = Throttle::new(ms(200));
        let mut seen = Vec::new();
        let t0 = Instant::now();

        assert!(throttle.call(t0, 1, |v| seen.push(v)));
        assert_eq!(seen, vec![1]);
        assert!(!throttle.is_pending());
    }

    #[test]
    fn test_burst_inside_window_collapses_to_leading_and_trailing() {
        let mut throttle = Throttle::new(ms(200));
        let mut seen = Vec::new();
        let t0 = Instant::now();

        for i in 0..10u64 {
            throttle.call(t0 + ms(i * 10), i, |v| seen.push(v));
        }
        assert_eq!(seen, vec![0]);

        // not yet due
        assert!(!throttle.flush(t0 + ms(150), |v| seen.push(v)));
        assert!(throttle.flush(t0 + ms(200), |v| seen.push(v)));
        assert_eq!(seen, vec![0, 9]);

        // nothing left
        assert!(!throttle.flush(t0 + ms(1000), |v| seen.push(v)));
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_call_after_interval_is_leading_again() {
        let mut throttle = Throttle::new(ms(100));
        let mut seen = Vec::new();
        let t0 = Instant::now();

        throttle.call(t0, "a", |v| seen.push(v));
        throttle.call(t0 + ms(150), "b", |v| seen.push(v));
        assert_eq!(seen, vec!["a", "b"]);
    }

    #[test]
    fn test_trailing_fire_restarts_window() {
        let mut throttle = Throttle::new(ms(100));
        let mut count = 0;
        let t0 = Instant::now();

        throttle.call(t0, (), |_| count += 1);
        throttle.call(t0 + ms(10), (), |_| count += 1);
        assert!(throttle.flush(t0 + ms(100), |_| count += 1));
        // inside the window opened by the trailing fire
        assert!(!throttle.call(t0 + ms(150), (), |_| count += 1));
        assert_eq!(count, 2);
    }

    #[test]
    fn test_cancel_drops_pending() {
        let mut throttle = Throttle::new(ms(100));
        let t0 = Instant::now();
        let mut seen = Vec::new();

        throttle.call(t0, 1, |v| seen.push(v));
        throttle.call(t0 + ms(5), 2, |v| seen.push(v));
        assert_eq!(throttle.cancel(), Some(2));
        assert!(!throttle.flush(t0 + ms(500), |v| seen.push(v)));
        assert_eq!(seen, vec![1]);
    }

    #[test]
    fn test_latest_callback_is_used() {
        let mut throttle = Throttle::new(ms(100));
        let t0 = Instant::now();
        let mut first = Vec::new();
        let mut second = Vec::new();

        throttle.call(t0, 1, |v| first.push(v));
        throttle.call(t0 + ms(10), 2, |v| first.push(v));
        throttle.flush(t0 + ms(100), |v| second.push(v));

        assert_eq!(first, vec![1]);
        assert_eq!(second, vec![2]);
    }

    #[test]
    fn test_interval_change_applies_to_next_call() {
        let mut throttle = Throttle::new(ms(1000));
        let t0 = Instant::now();
        let mut count = 0;

        throttle.call(t0, (), |_| count += 1);
        throttle.set_interval(ms(50));
        throttle.call(t0 + ms(60), (), |_| count += 1);
        assert_eq!(count, 2);
        assert_eq!(throttle.interval(), ms(50));
    }

    #[test]
    fn test_interval_for_rate() {
        assert_eq!(Throttle::<()>::interval_for_rate(5.0), ms(200));
        assert_eq!(Throttle::<()>::interval_for_rate(1.0), ms(1000));
        assert_eq!(Throttle::<()>::interval_for_rate(0.0), ms(1000));
    }
}
