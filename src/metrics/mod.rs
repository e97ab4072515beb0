use axum::{extract::Request, middleware::Next, response::Response};
use metrics::{counter, histogram, Counter, Histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use std::time::Instant;

pub struct RateLimitMetrics {
    pub rejections_total: Counter,
}

pub struct HttpMetrics {
    pub requests_total: Counter,
    pub errors_4xx_total: Counter,
    pub errors_5xx_total: Counter,
    pub latency_seconds: Histogram,
}

pub static RATE_LIMIT_METRICS: Lazy<RateLimitMetrics> = Lazy::new(|| RateLimitMetrics {
    rejections_total: counter!("rate_limit_rejections_total"),
});

pub static HTTP_METRICS: Lazy<HttpMetrics> = Lazy::new(|| HttpMetrics {
    requests_total: counter!("http_requests_total"),
    errors_4xx_total: counter!("http_4xx_total"),
    errors_5xx_total: counter!("http_5xx_total"),
    latency_seconds: histogram!("http_latency_seconds"),
});

pub fn record_request(status_code: u16, latency_seconds: f64) {
    HTTP_METRICS.requests_total.increment(1);
    HTTP_METRICS.latency_seconds.record(latency_seconds);

    match status_code {
        400..=499 => HTTP_METRICS.errors_4xx_total.increment(1),
        500..=599 => HTTP_METRICS.errors_5xx_total.increment(1),
        _ => {}
    }
}

/// Records count, status class and latency of every request.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;
    record_request(response.status().as_u16(), start.elapsed().as_secs_f64());
    response
}

/// Installs the global Prometheus recorder. Fails if one is already set.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}
