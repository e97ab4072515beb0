use std::time::{Duration, Instant};

use api_showcase::config::RateLimitingConfig;
use api_showcase::middleware::rate_limit::FixedWindowLimiter;
use api_showcase::models::{Item, NestedItem};
use api_showcase::validation::Schema;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn limiter_benchmark(c: &mut Criterion) {
    let limiter = FixedWindowLimiter::new(RateLimitingConfig {
        enabled: true,
        requests_per_window: 1_000_000,
        window_seconds: 60,
    });
    let now = Instant::now();

    c.bench_function("limiter_single_client", |b| {
        b.iter(|| black_box(limiter.check_at("127.0.0.1", now)))
    });

    let clients: Vec<String> = (0..1024).map(|i| format!("10.0.{}.{}", i / 256, i % 256)).collect();
    let mut i = 0;
    c.bench_function("limiter_many_clients", |b| {
        b.iter(|| {
            i = (i + 1) % clients.len();
            black_box(limiter.check_at(&clients[i], now + Duration::from_millis(i as u64)))
        })
    });
}

fn validation_benchmark(c: &mut Criterion) {
    let item = serde_json::json!({
        "name": "Foo",
        "description": "A very nice Item",
        "price": "35.4",
        "tax": 3.2
    });
    c.bench_function("item_validation", |b| {
        b.iter(|| black_box(Item::from_json(&item).unwrap()))
    });

    let nested = serde_json::json!({
        "name": "Foo",
        "price": 42.0,
        "tags": ["rock", "metal", "rock"],
        "images": [
            { "url": "http://example.com/baz.jpg", "name": "The Foo live" },
            { "url": "http://example.com/dave.jpg", "name": "The Baz" }
        ]
    });
    c.bench_function("nested_item_validation", |b| {
        b.iter(|| black_box(NestedItem::from_json(&nested).unwrap()))
    });
}

criterion_group!(benches, limiter_benchmark, validation_benchmark);
criterion_main!(benches);
