//! Fixed-window rate limiting per client IP.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use dashmap::DashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::time;

use crate::config::RateLimitConfig;
use crate::http::request::{client_ip, peer_addr};
use crate::observability::metrics;
use crate::routing::{Matcher, PathPrefixMatcher};

pub const RATE_LIMIT_MESSAGE: &str = "Too many requests, please try again later.";

/// One client's counter for the current window.
#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
}

/// Result of counting one request against a client's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the current window closes.
    pub reset_after: Duration,
}

impl RateLimitStatus {
    /// `RateLimit-*` headers, plus `Retry-After` when the request was rejected.
    pub fn apply_headers(&self, headers: &mut HeaderMap) {
        let reset_secs = self.reset_after.as_secs() + u64::from(self.reset_after.subsec_nanos() > 0);
        headers.insert("ratelimit-limit", HeaderValue::from(self.limit));
        headers.insert("ratelimit-remaining", HeaderValue::from(self.remaining));
        headers.insert("ratelimit-reset", HeaderValue::from(reset_secs));
        if !self.allowed {
            headers.insert("retry-after", HeaderValue::from(reset_secs));
        }
    }
}

/// In-memory fixed-window counter table keyed by client IP.
///
/// A window whose length has elapsed is treated exactly like a missing
/// entry; a request landing precisely on the window end opens a new one.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    windows: DashMap<IpAddr, Window>,
    max_requests: u32,
    window: Duration,
}

impl FixedWindowLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests,
            window,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, config.window())
    }

    pub fn check(&self, client: IpAddr) -> RateLimitStatus {
        self.check_at(client, Instant::now())
    }

    pub fn check_at(&self, client: IpAddr, now: Instant) -> RateLimitStatus {
        let mut entry = self.windows.entry(client).or_insert(Window {
            count: 0,
            started: now,
        });

        if now.saturating_duration_since(entry.started) >= self.window {
            *entry = Window {
                count: 0,
                started: now,
            };
        }
        entry.count = entry.count.saturating_add(1);

        let elapsed = now.saturating_duration_since(entry.started);
        RateLimitStatus {
            allowed: entry.count <= self.max_requests,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(entry.count),
            reset_after: self.window.saturating_sub(elapsed),
        }
    }

    /// Drop windows that have expired by `now`. Returns how many were removed.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started) < self.window);
        before.saturating_sub(self.windows.len())
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Periodically evict expired windows until shutdown.
    pub async fn run_sweeper(self: Arc<Self>, every: Duration, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = time::interval(every);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.sweep_at(Instant::now());
                    let tracked = self.tracked_clients();
                    metrics::record_rate_limit_clients(tracked);
                    if removed > 0 {
                        tracing::debug!(removed, tracked, "Swept expired rate limit windows");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Rate limit sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

/// State for the rate limiting middleware.
#[derive(Debug)]
pub struct RateLimiterState {
    pub limiter: Arc<FixedWindowLimiter>,
    scope: PathPrefixMatcher,
    enabled: bool,
    trust_forwarded_for: bool,
}

impl RateLimiterState {
    pub fn new(config: &RateLimitConfig, limiter: Arc<FixedWindowLimiter>) -> Self {
        Self {
            limiter,
            scope: PathPrefixMatcher::new(config.path_prefix.clone()),
            enabled: config.enabled,
            trust_forwarded_for: config.trust_forwarded_for,
        }
    }
}

/// The 429 answer for an exhausted client.
pub fn too_many_requests(status: &RateLimitStatus) -> Response {
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(serde_json::json!({ "error": RATE_LIMIT_MESSAGE })),
    )
        .into_response();
    status.apply_headers(response.headers_mut());
    response
}

/// Middleware function for per-IP rate limiting of the scoped prefix.
///
/// Requests outside the scope are never inspected. Connection info is
/// optional; without it clients fall back to forwarded headers (if trusted)
/// or a single shared key.
pub async fn rate_limit_middleware(
    State(state): State<Arc<RateLimiterState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.enabled || !state.scope.matches(&request) {
        return next.run(request).await;
    }

    let peer = peer_addr(request.extensions()).map(|addr| addr.ip());
    let client = client_ip(request.headers(), peer, state.trust_forwarded_for);
    let status = state.limiter.check(client);

    if status.allowed {
        let mut response = next.run(request).await;
        status.apply_headers(response.headers_mut());
        response
    } else {
        tracing::warn!(client = %client, path = %request.uri().path(), "Rate limit exceeded");
        metrics::record_rate_limited();
        too_many_requests(&status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([192, 168, 1, last])
    }

    #[test]
    fn test_max_requests_then_rejects() {
        let limiter = FixedWindowLimiter::new(30, Duration::from_secs(60));
        let start = Instant::now();

        for i in 0..30 {
            let status = limiter.check_at(ip(1), start + Duration::from_millis(i));
            assert!(status.allowed, "request {} should pass", i + 1);
            assert_eq!(status.remaining, 29 - i as u32);
        }
        let status = limiter.check_at(ip(1), start + Duration::from_secs(1));
        assert!(!status.allowed);
        assert_eq!(status.remaining, 0);
        assert_eq!(status.reset_after, Duration::from_secs(59));
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.check_at(ip(1), now).allowed);
        assert!(!limiter.check_at(ip(1), now).allowed);
        assert!(limiter.check_at(ip(2), now).allowed);
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn test_window_end_starts_new_window() {
        let limiter = FixedWindowLimiter::new(2, Duration::from_secs(60));
        let start = Instant::now();
        assert!(limiter.check_at(ip(1), start).allowed);
        assert!(limiter.check_at(ip(1), start).allowed);
        assert!(!limiter.check_at(ip(1), start + Duration::from_secs(59)).allowed);

        let status = limiter.check_at(ip(1), start + Duration::from_secs(60));
        assert!(status.allowed);
        assert_eq!(status.remaining, 1);
        assert_eq!(status.reset_after, Duration::from_secs(60));
    }

    #[test]
    fn test_remaining_never_underflows() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        for _ in 0..5 {
            let status = limiter.check_at(ip(1), now);
            assert!(status.remaining <= 1);
        }
        assert_eq!(limiter.check_at(ip(1), now).remaining, 0);
    }

    #[test]
    fn test_sweep_drops_only_expired_windows() {
        let limiter = FixedWindowLimiter::new(5, Duration::from_secs(10));
        let start = Instant::now();
        limiter.check_at(ip(1), start);
        limiter.check_at(ip(2), start + Duration::from_secs(5));

        assert_eq!(limiter.sweep_at(start + Duration::from_secs(10)), 1);
        assert_eq!(limiter.tracked_clients(), 1);
        assert_eq!(limiter.sweep_at(start + Duration::from_secs(15)), 1);
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn test_headers_on_rejection() {
        let status = RateLimitStatus {
            allowed: false,
            limit: 30,
            remaining: 0,
            reset_after: Duration::from_millis(12_500),
        };
        let response = too_many_requests(&status);
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["ratelimit-limit"], "30");
        assert_eq!(response.headers()["ratelimit-remaining"], "0");
        assert_eq!(response.headers()["ratelimit-reset"], "13");
        assert_eq!(response.headers()["retry-after"], "13");
    }
}
