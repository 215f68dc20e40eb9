//! Limitador de tasa para los endpoints de mutación.
//!
//! Ventana fija por cliente: dentro de cada ventana se admiten hasta
//! `max_requests` peticiones; al agotarse, el exceso recibe el sobre
//! estándar con código `RATE_LIMIT_EXCEEDED` (429).

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::api::error::error_envelope;
use crate::api::middleware::RequestId;
use crate::domain::error::LedgerError;

#[derive(Debug)]
pub struct RateLimiter {
    /// Máximo de peticiones admitidas por ventana.
    max_requests: u32,
    /// Duración de la ventana.
    window: Duration,
    /// Inicio de ventana y contador, por clave de cliente.
    windows: Mutex<HashMap<String, (Instant, u32)>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Registra una petición para `key` y decide si se admite.
    pub fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        let entry = windows.entry(key.to_string()).or_insert((now, 0));
        if now.duration_since(entry.0) >= self.window {
            *entry = (now, 0);
        }
        entry.1 += 1;

        entry.1 <= self.max_requests
    }
}

/// Middleware de limitación para las rutas de mutación.
///
/// La clave de cliente sale del primer valor de `X-Forwarded-For`; sin ese
/// header todas las peticiones comparten una clave global.
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let key = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "global".to_string());

    if !limiter.check(&key) {
        let request_id = request
            .extensions()
            .get::<RequestId>()
            .map(|r| r.0.clone())
            .unwrap_or_default();
        let (status, envelope) = error_envelope(&LedgerError::RateLimited, &request_id);
        return (status, Json(envelope)).into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_up_to_max_within_window() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));

        assert!(limiter.check("1.2.3.4"));
        assert!(limiter.check("1.2.3.4"));
        assert!(limiter.check("1.2.3.4"));
        assert!(!limiter.check("1.2.3.4"));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));

        assert!(limiter.check("a"));
        assert!(!limiter.check("a"));
        assert!(limiter.check("b"));
    }

    #[test]
    fn test_window_resets_after_elapsing() {
        let limiter = RateLimiter::new(1, Duration::from_millis(10));

        assert!(limiter.check("a"));
        assert!(!limiter.check("a"));
        std::thread::sleep(Duration::from_millis(15));
        assert!(limiter.check("a"));
    }
}
