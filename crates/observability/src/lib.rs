use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    provider_calls_total: AtomicU64,
    provider_errors_total: AtomicU64,
    empty_discoveries_total: AtomicU64,
    selector_fallback_total: AtomicU64,
    narrative_fallback_total: AtomicU64,
    encyclopedia_misses_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub provider_calls_total: u64,
    pub provider_errors_total: u64,
    pub empty_discoveries_total: u64,
    pub selector_fallback_total: u64,
    pub narrative_fallback_total: u64,
    pub encyclopedia_misses_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("wander_requests_total").increment(1);
    }

    pub fn inc_provider_call(&self) {
        self.provider_calls_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("wander_provider_calls_total").increment(1);
    }

    pub fn inc_provider_error(&self) {
        self.provider_errors_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("wander_provider_errors_total").increment(1);
    }

    pub fn inc_empty_discovery(&self) {
        self.empty_discoveries_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("wander_empty_discoveries_total").increment(1);
    }

    pub fn inc_selector_fallback(&self) {
        self.selector_fallback_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("wander_selector_fallback_total").increment(1);
    }

    pub fn inc_narrative_fallback(&self) {
        self.narrative_fallback_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("wander_narrative_fallback_total").increment(1);
    }

    pub fn inc_encyclopedia_miss(&self) {
        self.encyclopedia_misses_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("wander_encyclopedia_misses_total").increment(1);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
        metrics::histogram!("wander_request_latency_seconds").record(duration.as_secs_f64());
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            provider_calls_total: self.provider_calls_total.load(Ordering::Relaxed),
            provider_errors_total: self.provider_errors_total.load(Ordering::Relaxed),
            empty_discoveries_total: self.empty_discoveries_total.load(Ordering::Relaxed),
            selector_fallback_total: self.selector_fallback_total.load(Ordering::Relaxed),
            narrative_fallback_total: self.narrative_fallback_total.load(Ordering::Relaxed),
            encyclopedia_misses_total: self.encyclopedia_misses_total.load(Ordering::Relaxed),
            avg_latency_millis: if requests == 0 {
                0.0
            } else {
                latency as f64 / requests as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,wander_api=info,wander_agents=info,wander_core=warn",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}
