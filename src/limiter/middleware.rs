use super::{RateLimiter, Verdict};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::{HeaderValue, RETRY_AFTER};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const RATE_LIMITED_MESSAGE: &str = "Rate limit exceeded";

/// Key shared by requests that arrive without connection info.
pub const UNKNOWN_CLIENT: &str = "unknown";

pub const X_RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
pub const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";

#[derive(Clone)]
pub struct RateLimitLayerState {
    pub limiter: Arc<dyn RateLimiter>,
}

impl RateLimitLayerState {
    pub fn new(limiter: Arc<dyn RateLimiter>) -> Self {
        Self { limiter }
    }
}

/// Identifies the caller by remote IP, so every port of one host shares a budget.
pub fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

pub async fn enforce_rate_limit(
    State(state): State<RateLimitLayerState>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_key(&request);
    let limit = state.limiter.limit();

    match state.limiter.check(&client, Instant::now()) {
        Verdict::Admit { remaining } => {
            let mut response = next.run(request).await;
            set_limit_headers(response.headers_mut(), limit, remaining);
            response
        }
        Verdict::Reject { retry_after } => {
            tracing::warn!(
                client = %client,
                method = %request.method(),
                path = %request.uri().path(),
                "Rate limit exceeded"
            );
            let mut response = (StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED_MESSAGE).into_response();
            let headers = response.headers_mut();
            set_limit_headers(headers, limit, 0);
            headers.insert(RETRY_AFTER, HeaderValue::from(retry_after_secs(retry_after)));
            response
        }
    }
}

fn set_limit_headers(headers: &mut HeaderMap, limit: u32, remaining: u32) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(remaining));
}

/// Whole seconds, rounded up.
fn retry_after_secs(retry_after: Duration) -> u64 {
    retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0)
}
