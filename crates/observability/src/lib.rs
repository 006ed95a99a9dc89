use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Which generation path produced an answer that fell back to templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackKind {
    Explanation,
    Itinerary,
    Chat,
    Suggestions,
}

impl FallbackKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FallbackKind::Explanation => "explanation",
            FallbackKind::Itinerary => "itinerary",
            FallbackKind::Chat => "chat",
            FallbackKind::Suggestions => "suggestions",
        }
    }
}

#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    rate_limited_total: AtomicU64,
    model_calls_total: AtomicU64,
    model_failures_total: AtomicU64,
    model_tokens_total: AtomicU64,
    model_latency_millis: AtomicU64,
    itinerary_retries_total: AtomicU64,
    fallback_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub rate_limited_total: u64,
    pub model_calls_total: u64,
    pub model_failures_total: u64,
    pub model_tokens_total: u64,
    pub itinerary_retries_total: u64,
    pub fallback_total: u64,
    pub avg_model_latency_millis: f64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rate_limited(&self) {
        self.rate_limited_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("tripit_rate_limited_total").increment(1);
    }

    /// One model call, successful or not.
    pub fn record_model_call(
        &self,
        operation: &'static str,
        tokens: u64,
        elapsed: Duration,
        ok: bool,
    ) {
        self.model_calls_total.fetch_add(1, Ordering::Relaxed);
        self.model_tokens_total.fetch_add(tokens, Ordering::Relaxed);
        self.model_latency_millis
            .fetch_add(elapsed.as_millis() as u64, Ordering::Relaxed);
        if !ok {
            self.model_failures_total.fetch_add(1, Ordering::Relaxed);
        }

        let outcome = if ok { "ok" } else { "error" };
        metrics::counter!(
            "tripit_model_calls_total",
            "operation" => operation,
            "outcome" => outcome
        )
        .increment(1);
        metrics::counter!("tripit_model_tokens_total", "operation" => operation).increment(tokens);
        metrics::histogram!("tripit_model_latency_seconds", "operation" => operation)
            .record(elapsed.as_secs_f64());
    }

    pub fn inc_itinerary_retry(&self) {
        self.itinerary_retries_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("tripit_itinerary_retries_total").increment(1);
    }

    pub fn inc_fallback(&self, kind: FallbackKind) {
        self.fallback_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("tripit_fallback_total", "kind" => kind.as_str()).increment(1);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
        metrics::histogram!("tripit_request_latency_seconds").record(duration.as_secs_f64());
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);
        let calls = self.model_calls_total.load(Ordering::Relaxed);
        let model_latency = self.model_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            rate_limited_total: self.rate_limited_total.load(Ordering::Relaxed),
            model_calls_total: calls,
            model_failures_total: self.model_failures_total.load(Ordering::Relaxed),
            model_tokens_total: self.model_tokens_total.load(Ordering::Relaxed),
            itinerary_retries_total: self.itinerary_retries_total.load(Ordering::Relaxed),
            fallback_total: self.fallback_total.load(Ordering::Relaxed),
            avg_model_latency_millis: average(model_latency, calls),
            avg_latency_millis: average(latency, requests),
        }
    }
}

fn average(total: u64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,tripit_api=info,tripit_agents=info,tripit_catalog=info,tower_http=info",
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
