//! Auto-throttle for per-domain politeness
//!
//! Each domain gets a `DomainState` slot. Workers reserve the next free slot
//! before a request, and the delay between slots follows observed latency.

use crate::config::ThrottleConfig;
use crate::crawler::fetcher::{FetchError, FetchedPage, PageFetcher};
use crate::state::DomainState;
use crate::url::domain_of;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

/// Adapts request spacing per domain to the latency the server shows
pub struct AutoThrottle {
    config: ThrottleConfig,
    domains: Mutex<HashMap<String, DomainState>>,
}

impl AutoThrottle {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            domains: Mutex::new(HashMap::new()),
        }
    }

    /// Waits until a request to `domain` is allowed
    pub async fn acquire(&self, domain: &str) {
        if !self.config.enabled {
            return;
        }

        let wait = {
            let mut domains = self.domains.lock().unwrap_or_else(PoisonError::into_inner);
            let start_delay = Duration::from_secs_f64(self.config.start_delay);
            domains
                .entry(domain.to_string())
                .or_insert_with(|| DomainState::new(start_delay))
                .reserve_slot(Instant::now())
        };

        if !wait.is_zero() {
            debug!("Throttling {} for {:?}", domain, wait);
            tokio::time::sleep(wait).await;
        }
    }

    /// Feeds a completed request's latency back into the domain delay
    pub fn record(&self, domain: &str, latency: Duration, success: bool) {
        if !self.config.enabled {
            return;
        }

        let mut domains = self.domains.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(state) = domains.get_mut(domain) {
            state.adjust_delay(latency, success, &self.config);
        }
    }

    /// Returns the current delay for a domain, if it has been contacted
    pub fn current_delay(&self, domain: &str) -> Option<Duration> {
        let domains = self.domains.lock().unwrap_or_else(PoisonError::into_inner);
        domains.get(domain).map(|s| s.delay)
    }
}

/// Wraps a fetcher so every request passes through the auto-throttle
pub struct ThrottledFetcher<F> {
    inner: F,
    throttle: Arc<AutoThrottle>,
}

impl<F> ThrottledFetcher<F> {
    pub fn new(inner: F, throttle: Arc<AutoThrottle>) -> Self {
        Self { inner, throttle }
    }
}

#[async_trait]
impl<F: PageFetcher> PageFetcher for ThrottledFetcher<F> {
    async fn fetch_with_redirects(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let domain = domain_of(url).unwrap_or_default();

        self.throttle.acquire(&domain).await;
        let started = Instant::now();
        let result = self.inner.fetch_with_redirects(url).await;
        self.throttle.record(&domain, started.elapsed(), result.is_ok());

        result
    }
}
