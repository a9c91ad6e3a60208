//! Shared HTTP plumbing for the adapters

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

pub type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Browser-like agent; some Korean portals reject the default reqwest agent
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Direct limiter allowing `per_minute` requests per minute
pub fn rate_limiter(per_minute: u32) -> SharedRateLimiter {
    let per_minute = NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN);
    Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)))
}

/// Client with a request timeout and the shared user agent
pub fn client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Falling back to default HTTP client: {}", e);
            Client::new()
        })
}

/// Client that keeps cookies between requests
pub fn session_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .cookie_store(true)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Falling back to default HTTP client: {}", e);
            Client::new()
        })
}
