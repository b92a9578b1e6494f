use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::config::{
    max_proxy_body_bytes, upstream_base_url, upstream_connect_timeout, upstream_http_timeout,
};

#[derive(Clone)]
pub struct AppState {
    pub http_client: reqwest::Client,
    /// Flood backend origin, e.g. `http://127.0.0.1:8000`.
    pub upstream_base: Arc<str>,
    pub max_body_bytes: usize,
    pub started_at: DateTime<Utc>,
    pub observability: Arc<ObservabilityCounters>,
}

#[derive(Debug, Default)]
pub struct ObservabilityCounters {
    proxied_requests_total: AtomicU64,
    upstream_errors_total: AtomicU64,
    rejected_requests_total: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservabilitySnapshot {
    pub proxied_requests_total: u64,
    pub upstream_errors_total: u64,
    pub rejected_requests_total: u64,
}

impl ObservabilityCounters {
    pub fn snapshot(&self) -> ObservabilitySnapshot {
        ObservabilitySnapshot {
            proxied_requests_total: self.proxied_requests_total.load(Ordering::Relaxed),
            upstream_errors_total: self.upstream_errors_total.load(Ordering::Relaxed),
            rejected_requests_total: self.rejected_requests_total.load(Ordering::Relaxed),
        }
    }

    pub fn record_proxied_request(&self) {
        self.proxied_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upstream_error(&self) {
        self.upstream_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_request(&self) {
        self.rejected_requests_total.fetch_add(1, Ordering::Relaxed);
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::with_upstream(upstream_base_url())
    }

    pub fn with_upstream(upstream_base: impl Into<String>) -> Self {
        let request_timeout = upstream_http_timeout();
        let connect_timeout = upstream_connect_timeout();
        let http_client = reqwest::Client::builder()
            .user_agent("hanoi-flood-gateway/0.1")
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(
                    error = %e,
                    "failed to build configured HTTP client, falling back to defaults"
                );
                reqwest::Client::new()
            });
        let upstream_base: String = upstream_base.into();
        Self {
            http_client,
            upstream_base: Arc::from(upstream_base.trim_end_matches('/')),
            max_body_bytes: max_proxy_body_bytes(),
            started_at: Utc::now(),
            observability: Arc::new(ObservabilityCounters::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let counters = ObservabilityCounters::default();
        counters.record_proxied_request();
        counters.record_proxied_request();
        counters.record_upstream_error();
        assert_eq!(
            counters.snapshot(),
            ObservabilitySnapshot {
                proxied_requests_total: 2,
                upstream_errors_total: 1,
                rejected_requests_total: 0,
            }
        );
    }

    #[test]
    fn upstream_base_is_normalized() {
        let state = AppState::with_upstream("http://backend:8000/");
        assert_eq!(&*state.upstream_base, "http://backend:8000");
    }
}
