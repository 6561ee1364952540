//! Per-IP request budgets, keyed on the peer address from `ConnectInfo`.
//!
//! Order creation gets the strict budget (`RATE_LIMIT_STRICT_RPM`, default
//! 10) and order reads the standard one (`RATE_LIMIT_STANDARD_RPM`, default
//! 30). Gateway notifications are never limited; see `handlers::app`.

use std::sync::Arc;
use std::time::Duration;

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;

pub type RateLimitLayer =
    GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// A full burst of `requests_per_minute`, refilled evenly over the minute.
///
/// Zero is treated as one; `Config` never produces it.
pub fn per_ip_layer(requests_per_minute: u32) -> RateLimitLayer {
    let burst = requests_per_minute.max(1);
    let config = GovernorConfigBuilder::default()
        .period(Duration::from_millis((60_000 / u64::from(burst)).max(1)))
        .burst_size(burst)
        .finish()
        .expect("non-zero period and burst always build");

    GovernorLayer::new(Arc::new(config))
}
