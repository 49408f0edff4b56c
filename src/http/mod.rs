//! HTTP client module
//!
//! JSON-over-HTTP for the augmentation fetch: retries with constant,
//! linear or exponential backoff, honors `retry-after` on 429, throttles
//! through a `governor` token bucket and authenticates through `auth`.

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder};
pub use rate_limit::{RateLimiter, RateLimiterConfig};

#[cfg(test)]
mod tests;
