//! Per-IP rate limiting for the login and registration endpoints.
//!
//! Configure via RATE_LIMIT_AUTH_RPM (default: 20, 0 disables).

use std::sync::Arc;
use std::time::Duration;
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;

/// Rate limiter layer type alias using governor types directly
pub type RateLimitLayer = GovernorLayer<
    tower_governor::key_extractor::PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    axum::body::Body,
>;

/// Replenish one request every `60 / rpm` seconds, with a burst of `rpm`.
fn period_for(requests_per_minute: u32) -> Duration {
    Duration::from_secs((60 / requests_per_minute.max(1) as u64).max(1))
}

/// Rate limiter for credential endpoints. `requests_per_minute` must be > 0.
pub fn auth_layer(requests_per_minute: u32) -> RateLimitLayer {
    assert!(requests_per_minute > 0, "Rate limit must be greater than 0");

    let config = GovernorConfigBuilder::default()
        .period(period_for(requests_per_minute))
        .burst_size(requests_per_minute)
        .finish()
        .expect("Failed to build rate limiter config");

    GovernorLayer::new(Arc::new(config))
}
