use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::Error;

/// Fixed-window request limiter keyed by `action:caller`. Timestamps are
/// pruned on every check so the key store stays bounded to active callers.
#[derive(Clone, Debug)]
pub struct RateGuard {
    limit: u32,
    window: Duration,
    buckets: Arc<Mutex<HashMap<String, Vec<Instant>>>>,
}

impl RateGuard {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit: limit.max(1),
            window,
            buckets: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn allow(&self, action: &str, caller: &str) -> bool {
        self.allow_at(action, caller, Instant::now())
    }

    fn allow_at(&self, action: &str, caller: &str, now: Instant) -> bool {
        let key = format!("{}:{}", action, caller);
        let mut buckets = self.buckets.lock().expect("rate guard mutex poisoned");
        buckets.retain(|_, stamps| {
            stamps.retain(|t| now.duration_since(*t) < self.window);
            !stamps.is_empty()
        });
        let stamps = buckets.entry(key).or_default();
        if stamps.len() as u32 >= self.limit {
            false
        } else {
            stamps.push(now);
            true
        }
    }
}

#[derive(Clone)]
pub struct ActionGuard {
    guard: RateGuard,
    action: &'static str,
}

pub fn new_action_state(guard: &RateGuard, action: &'static str) -> ActionGuard {
    ActionGuard {
        guard: guard.clone(),
        action,
    }
}

fn caller_identity(req: &Request<Body>) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "local".to_string())
}

pub async fn action_middleware(
    State(state): State<ActionGuard>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let caller = caller_identity(&req);
    if !state.guard.allow(state.action, &caller) {
        tracing::warn!(action = state.action, caller = %caller, "rate limit exceeded");
        return Error::TooManyRequests.into_response();
    }
    next.run(req).await
}
