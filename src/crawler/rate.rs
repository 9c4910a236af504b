//! Global request pacing shared by all crawl workers
//!
//! Two mechanisms, applied in order before every render:
//! 1. a token bucket (capacity and refill both equal to the configured
//!    requests per second), disabled when the rate is zero
//! 2. a fixed pause after each token

use crate::config::CrawlConfig;
use crate::Cancelled;
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

type DirectRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Token bucket plus fixed inter-request delay
pub struct RateController {
    limiter: Option<DirectRateLimiter>,
    delay: Duration,
}

impl RateController {
    /// Creates a controller
    ///
    /// # Arguments
    ///
    /// * `requests_per_second` - Sustained rate; `0` (or anything not
    ///   positive and finite) disables the token bucket
    /// * `delay` - Fixed pause after each token
    pub fn new(requests_per_second: f64, delay: Duration) -> Self {
        let limiter = build_quota(requests_per_second).map(RateLimiter::direct);

        if limiter.is_some() {
            tracing::info!(
                "Rate limit enabled: {:.2} requests/second",
                requests_per_second
            );
        }
        if !delay.is_zero() {
            tracing::info!("Request delay enabled: {:?} between requests", delay);
        }

        Self { limiter, delay }
    }

    pub fn from_config(config: &CrawlConfig) -> Self {
        Self::new(config.rate_limit, config.delay)
    }

    /// Returns true if the token bucket is active
    pub fn is_limited(&self) -> bool {
        self.limiter.is_some()
    }

    /// Blocks until a token is available or `cancel` fires
    pub async fn wait(&self, cancel: &CancellationToken) -> Result<(), Cancelled> {
        let Some(limiter) = &self.limiter else {
            return Ok(());
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(Cancelled),
            _ = limiter.until_ready() => Ok(()),
        }
    }

    /// Sleeps for the fixed delay, returning early on cancellation
    pub async fn pause(&self, cancel: &CancellationToken) -> Result<(), Cancelled> {
        if self.delay.is_zero() {
            return if cancel.is_cancelled() {
                Err(Cancelled)
            } else {
                Ok(())
            };
        }

        tokio::select! {
            _ = cancel.cancelled() => Err(Cancelled),
            _ = tokio::time::sleep(self.delay) => Ok(()),
        }
    }

    /// Applies the token bucket and then the fixed delay
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), Cancelled> {
        self.wait(cancel).await?;
        self.pause(cancel).await
    }
}

/// One token every `1 / rate` seconds with a burst of `max(1, floor(rate))`
fn build_quota(requests_per_second: f64) -> Option<Quota> {
    if !requests_per_second.is_finite() || requests_per_second <= 0.0 {
        return None;
    }

    let period = Duration::try_from_secs_f64(1.0 / requests_per_second).ok()?;
    let burst = NonZeroU32::new((requests_per_second.floor() as u32).max(1))?;

    Quota::with_period(period).map(|quota| quota.allow_burst(burst))
}
