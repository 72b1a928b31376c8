//! Rate limiting and retry decorator for any [`MarketDataPort`].
//!
//! Every call waits for a permit from a direct `governor` limiter. Calls that
//! fail with a retryable [`ProviderError`] are repeated after
//! `base_delay * 2^attempt`, up to `retry_attempts` extra tries.

use std::num::NonZeroU32;
use std::thread;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tracing::warn;

use crate::domain::config::ThrottleConfig;
use crate::domain::error::ProviderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::series::HistoryRequest;
use crate::ports::market_data_port::{MarketDataPort, NewsItem, StaticInfo};

const MAX_BACKOFF_SHIFT: u32 = 16;

pub struct ThrottledProvider<P> {
    inner: P,
    limiter: DefaultDirectRateLimiter,
    clock: DefaultClock,
    retry_attempts: u32,
    base_delay: Duration,
}

impl<P: MarketDataPort> ThrottledProvider<P> {
    pub fn new(inner: P, config: &ThrottleConfig) -> Self {
        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            inner,
            limiter: RateLimiter::direct(Quota::per_second(per_second)),
            clock: DefaultClock::default(),
            retry_attempts: config.retry_attempts,
            base_delay: config.retry_base_delay,
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Blocks until the limiter grants a permit.
    fn acquire(&self) {
        while let Err(not_until) = self.limiter.check() {
            thread::sleep(not_until.wait_time_from(self.clock.now()));
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(1u32 << attempt.min(MAX_BACKOFF_SHIFT))
    }

    fn call<T>(
        &self,
        symbol: &str,
        operation: &'static str,
        f: impl Fn(&P) -> Result<T, ProviderError>,
    ) -> Result<T, ProviderError> {
        let mut attempt = 0;
        loop {
            self.acquire();
            match f(&self.inner) {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retryable() && attempt < self.retry_attempts => {
                    let delay = self.backoff(attempt);
                    attempt += 1;
                    warn!(
                        symbol,
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        %error,
                        "Retrying provider call"
                    );
                    thread::sleep(delay);
                }
                Err(error) => return Err(error),
            }
        }
    }
}

impl<P: MarketDataPort> MarketDataPort for ThrottledProvider<P> {
    fn fetch_history(
        &self,
        symbol: &str,
        request: &HistoryRequest,
    ) -> Result<Vec<OhlcvBar>, ProviderError> {
        self.call(symbol, "history", |p| p.fetch_history(symbol, request))
    }

    fn fetch_static_info(&self, symbol: &str) -> Result<StaticInfo, ProviderError> {
        self.call(symbol, "static_info", |p| p.fetch_static_info(symbol))
    }

    fn fetch_latest_news(&self, symbol: &str) -> Result<Vec<NewsItem>, ProviderError> {
        self.call(symbol, "news", |p| p.fetch_latest_news(symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    /// Fails the first `failures` calls with `error`, then succeeds.
    struct FlakyProvider {
        failures: u32,
        error: ProviderError,
        calls: AtomicU32,
    }

    impl FlakyProvider {
        fn new(failures: u32, error: ProviderError) -> Self {
            Self {
                failures,
                error,
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl MarketDataPort for FlakyProvider {
        fn fetch_history(
            &self,
            _symbol: &str,
            _request: &HistoryRequest,
        ) -> Result<Vec<OhlcvBar>, ProviderError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(self.error.clone())
            } else {
                Ok(Vec::new())
            }
        }

        fn fetch_static_info(&self, _symbol: &str) -> Result<StaticInfo, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(StaticInfo::default())
        }

        fn fetch_latest_news(&self, _symbol: &str) -> Result<Vec<NewsItem>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    fn config(rps: u32, retries: u32) -> ThrottleConfig {
        ThrottleConfig {
            requests_per_second: rps,
            retry_attempts: retries,
            retry_base_delay: Duration::from_millis(1),
        }
    }

    fn network() -> ProviderError {
        ProviderError::Network {
            reason: "connection reset".to_string(),
        }
    }

    #[test]
    fn retries_transient_errors() {
        let provider = ThrottledProvider::new(FlakyProvider::new(2, network()), &config(1000, 3));
        let result = provider.fetch_history("ABC", &HistoryRequest::daily(5));
        assert!(result.is_ok());
        assert_eq!(provider.inner().calls(), 3);
    }

    #[test]
    fn gives_up_after_retry_budget() {
        let provider = ThrottledProvider::new(FlakyProvider::new(10, network()), &config(1000, 2));
        let result = provider.fetch_history("ABC", &HistoryRequest::daily(5));
        assert_eq!(result.unwrap_err(), network());
        assert_eq!(provider.inner().calls(), 3);
    }

    #[test]
    fn does_not_retry_not_found() {
        let not_found = ProviderError::NotFound {
            symbol: "ABC".to_string(),
        };
        let provider = ThrottledProvider::new(FlakyProvider::new(1, not_found), &config(1000, 3));
        assert!(provider.fetch_history("ABC", &HistoryRequest::daily(5)).is_err());
        assert_eq!(provider.inner().calls(), 1);
    }

    #[test]
    fn backoff_doubles() {
        let provider = ThrottledProvider::new(FlakyProvider::new(0, network()), &config(1, 3));
        assert_eq!(provider.backoff(0), Duration::from_millis(1));
        assert_eq!(provider.backoff(3), Duration::from_millis(8));
    }

    #[test]
    fn limiter_spaces_out_calls() {
        let provider = ThrottledProvider::new(FlakyProvider::new(0, network()), &config(2, 0));
        let start = Instant::now();
        for _ in 0..3 {
            provider.fetch_static_info("ABC").unwrap();
        }
        // Burst of two, then the third waits roughly half a second.
        assert!(start.elapsed() >= Duration::from_millis(400));
        assert_eq!(provider.inner().calls(), 3);
    }
}
