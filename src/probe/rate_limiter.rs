//! Rate limiting for probe starts.
//!
//! Token bucket pacing so a run against a large topology does not open a
//! burst of connections toward the edge pools.

use governor::{Quota, RateLimiter as GovLimiter};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;
use std::sync::Arc;

type DirectLimiter = GovLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Limits how many probes may start per second.
///
/// Clones share the same bucket.
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<DirectLimiter>,
}

impl RateLimiter {
    /// Create a limiter allowing `rate` probe starts per second.
    ///
    /// Returns `None` for a rate of 0, which means unlimited.
    pub fn per_second(rate: u32) -> Option<Self> {
        let rate = NonZeroU32::new(rate)?;
        let quota = Quota::per_second(rate).allow_burst(nonzero!(1u32));

        Some(Self {
            limiter: Arc::new(GovLimiter::direct(quota)),
        })
    }

    /// Wait until the next probe may start.
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish_non_exhaustive()
    }
}
