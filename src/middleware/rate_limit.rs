//! Fixed-window request-rate limiting keyed by client address.
//!
//! Each client owns a counter and the instant its current window started.
//! A request more than one window after that start opens a new window with
//! a count of one; otherwise it is admitted while the count is below the
//! threshold and rejected after that.

use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use dashmap::DashMap;
use serde_json::json;
use tracing::debug;

use crate::config::RateLimitingConfig;
use crate::metrics::RATE_LIMIT_METRICS;

pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please try again later.";

/// Client key used when the peer address is not known.
const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Admitted; `count` is the client's count in the current window.
    Admitted { count: u32 },
    Rejected,
}

impl Decision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Decision::Admitted { .. })
    }
}

#[derive(Debug)]
pub struct FixedWindowLimiter {
    settings: RwLock<RateLimitingConfig>,
    windows: DashMap<String, Window>,
}

impl FixedWindowLimiter {
    pub fn new(settings: RateLimitingConfig) -> Self {
        Self {
            settings: RwLock::new(settings),
            windows: DashMap::new(),
        }
    }

    pub fn settings(&self) -> RateLimitingConfig {
        self.settings
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replaces threshold and window. Open windows keep their state.
    pub fn reconfigure(&self, settings: RateLimitingConfig) {
        debug!(?settings, "Rate limiter reconfigured");
        *self
            .settings
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = settings;
    }

    pub fn check(&self, client: &str) -> Decision {
        self.check_at(client, Instant::now())
    }

    /// Decides for a request from `client` arriving at `now`.
    pub fn check_at(&self, client: &str, now: Instant) -> Decision {
        let settings = self.settings();
        if !settings.enabled {
            return Decision::Admitted { count: 0 };
        }
        let window = settings.window();

        // The entry guard holds the shard lock for the whole read-modify-write.
        let mut entry = self
            .windows
            .entry(client.to_string())
            .or_insert(Window { count: 0, started: now });

        if now.saturating_duration_since(entry.started) > window || entry.count == 0 {
            *entry = Window { count: 1, started: now };
            return Decision::Admitted { count: 1 };
        }

        if entry.count < settings.requests_per_window {
            entry.count += 1;
            Decision::Admitted { count: entry.count }
        } else {
            Decision::Rejected
        }
    }

    /// Current count for a client, if it has an entry.
    pub fn count(&self, client: &str) -> Option<u32> {
        self.windows.get(client).map(|w| w.count)
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Drops every window that has already elapsed at `now`.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let window = self.settings().window();
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started) <= window);
        before.saturating_sub(self.windows.len())
    }

    pub fn purge_interval(&self) -> Duration {
        self.settings().window().max(Duration::from_secs(1))
    }
}

/// Identifies the client by its peer IP address.
pub fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

pub async fn rate_limit_middleware(
    State(limiter): State<Arc<FixedWindowLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_key(&request);

    match limiter.check(&client) {
        Decision::Admitted { count } => {
            debug!(client = %client, count, "Request admitted");
            next.run(request).await
        }
        Decision::Rejected => {
            RATE_LIMIT_METRICS.rejections_total.increment(1);
            debug!(client = %client, path = request.uri().path(), "Rate limit exceeded");
            rate_limited_response()
        }
    }
}

pub fn rate_limited_response() -> Response {
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({ "message": RATE_LIMIT_MESSAGE })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(threshold: u32, window_seconds: u64) -> FixedWindowLimiter {
        FixedWindowLimiter::new(RateLimitingConfig {
            enabled: true,
            requests_per_window: threshold,
            window_seconds,
        })
    }

    fn at(start: Instant, secs: u64) -> Instant {
        start + Duration::from_secs(secs)
    }

    #[test]
    fn test_requests_up_to_threshold_are_admitted() {
        let limiter = limiter(5, 60);
        let start = Instant::now();

        for i in 0..5 {
            assert_eq!(
                limiter.check_at("10.0.0.1", at(start, i)),
                Decision::Admitted { count: i as u32 + 1 }
            );
        }
    }

    #[test]
    fn test_request_over_threshold_is_rejected() {
        let limiter = limiter(2, 60);
        let start = Instant::now();

        assert!(limiter.check_at("10.0.0.1", start).is_admitted());
        assert!(limiter.check_at("10.0.0.1", at(start, 1)).is_admitted());
        assert_eq!(limiter.check_at("10.0.0.1", at(start, 2)), Decision::Rejected);
        // Rejections do not count.
        assert_eq!(limiter.count("10.0.0.1"), Some(2));
    }

    #[test]
    fn test_minute_scenario() {
        let limiter = limiter(3, 60);
        let start = Instant::now();
        let client = "1.2.3.4";

        assert_eq!(limiter.check_at(client, at(start, 0)), Decision::Admitted { count: 1 });
        assert_eq!(limiter.check_at(client, at(start, 10)), Decision::Admitted { count: 2 });
        assert_eq!(limiter.check_at(client, at(start, 20)), Decision::Admitted { count: 3 });
        assert_eq!(limiter.check_at(client, at(start, 30)), Decision::Rejected);
        assert_eq!(limiter.check_at(client, at(start, 61)), Decision::Admitted { count: 1 });
    }

    #[test]
    fn test_window_is_measured_from_its_first_request() {
        let limiter = limiter(3, 60);
        let start = Instant::now();

        limiter.check_at("a", at(start, 0));
        limiter.check_at("a", at(start, 59));
        // 60s is not past the window yet.
        assert_eq!(limiter.check_at("a", at(start, 60)), Decision::Admitted { count: 3 });
        assert_eq!(limiter.check_at("a", at(start, 61)), Decision::Admitted { count: 1 });
    }

    #[test]
    fn test_boundary_burst_is_possible() {
        let limiter = limiter(3, 60);
        let start = Instant::now();

        let admitted = [0, 58, 59, 61, 62, 63]
            .into_iter()
            .filter(|&t| limiter.check_at("a", at(start, t)).is_admitted())
            .count();
        assert_eq!(admitted, 6);
    }

    #[test]
    fn test_clients_are_isolated() {
        let limiter = limiter(1, 60);
        let start = Instant::now();

        assert!(limiter.check_at("1.1.1.1", start).is_admitted());
        assert_eq!(limiter.check_at("1.1.1.1", start), Decision::Rejected);
        assert!(limiter.check_at("2.2.2.2", start).is_admitted());
        assert_eq!(limiter.count("1.1.1.1"), Some(1));
    }

    #[test]
    fn test_disabled_admits_everything() {
        let limiter = FixedWindowLimiter::new(RateLimitingConfig {
            enabled: false,
            ..RateLimitingConfig::default()
        });
        let start = Instant::now();

        for _ in 0..100 {
            assert!(limiter.check_at("a", start).is_admitted());
        }
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn test_reconfigure_raises_threshold() {
        let limiter = limiter(1, 60);
        let start = Instant::now();

        limiter.check_at("a", start);
        assert_eq!(limiter.check_at("a", start), Decision::Rejected);

        limiter.reconfigure(RateLimitingConfig {
            enabled: true,
            requests_per_window: 2,
            window_seconds: 60,
        });
        assert_eq!(limiter.check_at("a", start), Decision::Admitted { count: 2 });
    }

    #[test]
    fn test_purge_expired() {
        let limiter = limiter(3, 60);
        let start = Instant::now();

        limiter.check_at("old", start);
        limiter.check_at("new", at(start, 50));

        assert_eq!(limiter.purge_expired(at(start, 100)), 1);
        assert_eq!(limiter.count("old"), None);
        assert_eq!(limiter.count("new"), Some(1));
    }

    #[test]
    fn test_concurrent_checks_do_not_lose_updates() {
        let limiter = Arc::new(limiter(1000, 60));
        let start = Instant::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        limiter.check_at("shared", start);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(limiter.count("shared"), Some(800));
    }
}
