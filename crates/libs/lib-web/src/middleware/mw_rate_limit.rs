//! # Rate Limiting Middleware
//!
//! Fixed-window request counters keyed by client IP. Each [`RateLimiter`] enforces
//! one [`RateLimitRule`]; the router stacks a general limiter over every route and
//! tighter ones over the auth and send-message routes.
//!
//! ```rust,ignore
//! let limiter = Arc::new(RateLimiter::new(config.rate_limits.auth.clone()));
//! let routes = Router::new()
//!     .route("/api/auth/login", post(login))
//!     .route_layer(axum::middleware::from_fn_with_state(limiter, rate_limit));
//! ```
//!
//! Every response carries `RateLimit-Limit`, `RateLimit-Remaining` and
//! `RateLimit-Reset` (seconds until the window resets).

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use lib_core::{AppError, RateLimitRule};
use tracing::warn;

/// Windows are pruned once the table grows past this many clients.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_after: Duration,
}

#[derive(Debug)]
pub struct RateLimiter {
    rule: RateLimitRule,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(rule: RateLimitRule) -> Self {
        Self {
            rule,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn rule(&self) -> &RateLimitRule {
        &self.rule
    }

    /// Count a request from `key` at `now`.
    pub fn check_at(&self, key: &str, now: Instant) -> Quota {
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if windows.len() > PRUNE_THRESHOLD {
            let window_len = self.rule.window;
            windows.retain(|_, w| now.duration_since(w.started) < window_len);
        }

        let window = windows.entry(key.to_string()).or_insert(Window { started: now, count: 0 });
        if now.duration_since(window.started) >= self.rule.window {
            *window = Window { started: now, count: 0 };
        }

        window.count = window.count.saturating_add(1);

        let limit = self.rule.max_requests;
        Quota {
            allowed: window.count <= limit,
            limit,
            remaining: limit.saturating_sub(window.count),
            reset_after: self.rule.window.saturating_sub(now.duration_since(window.started)),
        }
    }

    pub fn check(&self, key: &str) -> Quota {
        self.check_at(key, Instant::now())
    }
}

/// Middleware enforcing the limiter given as state.
pub async fn rate_limit(State(limiter): State<Arc<RateLimiter>>, req: Request, next: Next) -> Response {
    let key = client_key(&req);
    let quota = limiter.check(&key);

    let mut response = if quota.allowed {
        next.run(req).await
    } else {
        warn!(client = %key, path = %req.uri().path(), "[RATE LIMIT] Quota exceeded");
        AppError::RateLimited(limiter.rule().message.clone()).into_response()
    };

    set_headers(response.headers_mut(), &quota);
    response
}

/// Peer address when known, else proxy headers, else one shared bucket.
fn client_key(req: &Request) -> String {
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    let headers = req.headers();
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn set_headers(headers: &mut HeaderMap, quota: &Quota) {
    let reset_secs = quota.reset_after.as_secs_f64().ceil() as u64;
    headers.insert("ratelimit-limit", HeaderValue::from(quota.limit));
    headers.insert("ratelimit-remaining", HeaderValue::from(quota.remaining));
    headers.insert("ratelimit-reset", HeaderValue::from(reset_secs));
}
