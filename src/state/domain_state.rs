use crate::config::ThrottleConfig;
use std::time::{Duration, Instant};

/// Tracks the politeness state of a domain during crawling
///
/// Holds the current adaptive delay and the time slot reserved by the most
/// recent request, so concurrent workers are spaced at least `delay` apart.
#[derive(Debug, Clone)]
pub struct DomainState {
    /// Number of requests made to this domain in the current crawl
    pub request_count: u32,

    /// Time slot reserved by the latest request to this domain
    pub last_request_time: Option<Instant>,

    /// Current delay between consecutive requests
    pub delay: Duration,

    /// Latency of the most recent completed response
    pub last_latency: Option<Duration>,
}

impl DomainState {
    /// Creates a new DomainState starting at the given delay
    pub fn new(start_delay: Duration) -> Self {
        Self {
            request_count: 0,
            last_request_time: None,
            delay: start_delay,
            last_latency: None,
        }
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now.
    pub fn time_until_next_request(&self, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let ready_at = last + self.delay;
        if ready_at > now {
            Some(ready_at - now)
        } else {
            None
        }
    }

    /// Reserves the next request slot and returns how long to wait for it
    pub fn reserve_slot(&mut self, now: Instant) -> Duration {
        let wait = self.time_until_next_request(now).unwrap_or(Duration::ZERO);
        self.request_count += 1;
        self.last_request_time = Some(now + wait);
        wait
    }

    /// Adapts the delay to an observed response latency
    ///
    /// The delay moves halfway towards `latency / target_concurrency`, never
    /// below that target, clamped to the configured bounds. Failed responses
    /// may only increase the delay.
    pub fn adjust_delay(&mut self, latency: Duration, success: bool, config: &ThrottleConfig) {
        self.last_latency = Some(latency);

        let old = self.delay.as_secs_f64();
        let target = latency.as_secs_f64() / config.target_concurrency;
        let mut new = ((old + target) / 2.0).max(target);
        new = new.max(config.min_delay).min(config.max_delay);

        if !success && new <= old {
            return;
        }

        self.delay = Duration::from_secs_f64(new);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ThrottleConfig {
        ThrottleConfig {
            enabled: true,
            start_delay: 5.0,
            min_delay: 0.0,
            max_delay: 60.0,
            target_concurrency: 1.0,
        }
    }

    #[test]
    fn test_first_request_is_immediate() {
        let mut state = DomainState::new(Duration::from_secs(5));
        let now = Instant::now();
        assert_eq!(state.time_until_next_request(now), None);
        assert_eq!(state.reserve_slot(now), Duration::ZERO);
        assert_eq!(state.request_count, 1);
    }

    #[test]
    fn test_consecutive_reservations_are_spaced() {
        let mut state = DomainState::new(Duration::from_millis(100));
        let now = Instant::now();

        assert_eq!(state.reserve_slot(now), Duration::ZERO);
        assert_eq!(state.reserve_slot(now), Duration::from_millis(100));
        assert_eq!(state.reserve_slot(now), Duration::from_millis(200));
    }

    #[test]
    fn test_delay_converges_towards_latency() {
        let mut state = DomainState::new(Duration::from_secs(5));
        state.adjust_delay(Duration::from_secs(1), true, &config());
        // (5 + 1) / 2
        assert_eq!(state.delay, Duration::from_secs(3));
        assert_eq!(state.last_latency, Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_delay_never_below_target() {
        let mut state = DomainState::new(Duration::from_millis(0));
        state.adjust_delay(Duration::from_secs(2), true, &config());
        assert_eq!(state.delay, Duration::from_secs(2));
    }

    #[test]
    fn test_delay_clamped_to_max() {
        let mut state = DomainState::new(Duration::from_secs(50));
        state.adjust_delay(Duration::from_secs(100), true, &config());
        assert_eq!(state.delay, Duration::from_secs(60));
    }

    #[test]
    fn test_failed_response_cannot_decrease_delay() {
        let mut state = DomainState::new(Duration::from_secs(5));
        state.adjust_delay(Duration::from_secs(1), false, &config());
        assert_eq!(state.delay, Duration::from_secs(5));

        state.adjust_delay(Duration::from_secs(20), false, &config());
        assert!(state.delay > Duration::from_secs(5));
    }
}
