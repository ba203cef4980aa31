use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

/// Token bucket refilled continuously at `per_second` tokens a second and
/// capped at one second's worth, so bursts never exceed the configured rate.
#[derive(Debug)]
struct Bucket {
    tokens: f64,
    refilled_at: Instant,
}

impl Bucket {
    /// Takes a token, or returns how long until one is available.
    fn take(&mut self, now: Instant, per_second: f64) -> Result<(), Duration> {
        let elapsed = now.saturating_duration_since(self.refilled_at).as_secs_f64();
        self.tokens = (self.tokens + elapsed * per_second).min(per_second);
        self.refilled_at = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            Err(Duration::from_secs_f64((1.0 - self.tokens) / per_second))
        }
    }
}

/// Shared across every request through the layer; cloning shares the bucket.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    per_second: f64,
    bucket: Arc<Mutex<Bucket>>,
}

impl RateLimiter {
    pub fn per_second(limit: u32) -> Self {
        let per_second = f64::from(limit.max(1));
        Self {
            per_second,
            bucket: Arc::new(Mutex::new(Bucket {
                tokens: per_second,
                refilled_at: Instant::now(),
            })),
        }
    }

    fn check_at(&self, now: Instant) -> Result<(), Duration> {
        let mut bucket = self.bucket.lock().unwrap_or_else(|e| e.into_inner());
        bucket.take(now, self.per_second)
    }

    pub fn check(&self) -> Result<(), Duration> {
        self.check_at(Instant::now())
    }
}

/// Whole seconds a client should wait, never less than one.
fn retry_after_secs(wait: Duration) -> u64 {
    wait.as_secs_f64().ceil().max(1.0) as u64
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    match limiter.check() {
        Ok(()) => next.run(req).await,
        Err(wait) => {
            let retry_after = retry_after_secs(wait);
            tracing::warn!(path = %req.uri().path(), retry_after, "rate limit exceeded");
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_after.to_string())],
                Json(json!({ "error": "rate_limit_exceeded" })),
            )
                .into_response()
        }
    }
}
