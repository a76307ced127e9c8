// src/middleware/rate_limit.rs

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use serde_json::json;

use crate::config::AppState;

#[derive(Debug, Clone)]
struct RateLimitEntry {
    count: u32,
    window_start: Instant,
}

// Limitador de janela fixa em memória, chaveado pelo IP do cliente.
// Uma instância única vive no AppState e é compartilhada por todas as rotas.
#[derive(Clone)]
pub struct RateLimiter {
    entries: Arc<DashMap<String, RateLimitEntry>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            max_requests,
            window,
        }
    }

    // Separado do middleware (e recebendo o relógio) para ser testável.
    fn check(&self, key: &str, now: Instant) -> bool {
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| RateLimitEntry { count: 0, window_start: now });

        if now.duration_since(entry.window_start) >= self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= self.max_requests {
            return false;
        }

        entry.count += 1;
        true
    }
}

pub async fn rate_limit_guard(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    // Atrás de proxy o IP real vem no X-Forwarded-For; sem ele, a chave
    // degrada para um balde global.
    let key = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "global".to_string());

    if !app_state.rate_limiter.check(&key, Instant::now()) {
        tracing::warn!("Rate limit excedido para {}", key);
        let body = Json(json!({ "error": "Muitas requisições. Tente novamente em instantes." }));
        return (StatusCode::TOO_MANY_REQUESTS, body).into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_limit_then_blocks() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.check("10.0.0.1", now));
        assert!(limiter.check("10.0.0.1", now));
        assert!(limiter.check("10.0.0.1", now));
        assert!(!limiter.check("10.0.0.1", now));
    }

    #[test]
    fn window_expiry_resets_the_count() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();

        assert!(limiter.check("10.0.0.1", start));
        assert!(!limiter.check("10.0.0.1", start + Duration::from_secs(30)));
        assert!(limiter.check("10.0.0.1", start + Duration::from_secs(61)));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.check("10.0.0.1", now));
        assert!(limiter.check("10.0.0.2", now));
        assert!(!limiter.check("10.0.0.1", now));
    }
}
