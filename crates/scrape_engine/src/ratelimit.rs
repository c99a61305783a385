use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use scrape_core::ScrapeError;
use tokio_util::sync::CancellationToken;

/// Token bucket shared by every worker of one scrape run.
///
/// Holds up to `burst` tokens, refilled continuously at `rate` tokens per
/// second. The bucket starts full. Waiters are not served in FIFO order, but
/// each one retries as soon as its token is due, so none starves while tokens
/// keep refilling.
#[derive(Debug)]
pub struct TokenBucket {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl TokenBucket {
    pub fn new(quota: Quota) -> Self {
        Self {
            limiter: RateLimiter::direct(quota),
        }
    }

    /// Wait for one token, or return [`ScrapeError::Cancelled`] as soon as
    /// `cancel` fires. An already cancelled `cancel` never consumes a token.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), ScrapeError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(ScrapeError::Cancelled),
            () = self.limiter.until_ready() => Ok(()),
        }
    }

    /// Take a token only if one is available right now.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}
