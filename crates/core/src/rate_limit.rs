use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 100;

/// Process-wide ceiling on outbound requests. Clones share the same bucket.
#[derive(Clone)]
pub struct RequestRateLimiter {
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    requests_per_second: u32,
}

impl RequestRateLimiter {
    pub fn new(requests_per_second: u32) -> Self {
        let per_second = NonZeroU32::new(requests_per_second)
            .or(NonZeroU32::new(DEFAULT_REQUESTS_PER_SECOND))
            .unwrap_or(NonZeroU32::MIN);

        Self {
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(per_second))),
            requests_per_second: per_second.get(),
        }
    }

    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

    pub fn requests_per_second(&self) -> u32 {
        self.requests_per_second
    }
}

impl std::fmt::Debug for RequestRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestRateLimiter")
            .field("requests_per_second", &self.requests_per_second)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_falls_back_to_default() {
        let limiter = RequestRateLimiter::new(0);
        assert_eq!(limiter.requests_per_second(), DEFAULT_REQUESTS_PER_SECOND);
    }

    #[tokio::test]
    async fn clones_share_one_bucket() {
        let limiter = RequestRateLimiter::new(1_000);
        let shared = limiter.clone();
        for _ in 0..5 {
            limiter.wait().await;
            shared.wait().await;
        }
        assert_eq!(shared.requests_per_second(), 1_000);
    }
}
