//! Metrics collection for observability

use prometheus::{
    register_counter_vec_with_registry, register_counter_with_registry,
    register_histogram_with_registry, Counter, CounterVec, Histogram, Opts, Registry,
};
use std::sync::Arc;
use once_cell::sync::Lazy;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> = Lazy::new(|| {
    Arc::new(Metrics::new().expect("Failed to initialize metrics"))
});

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    // Mailbox metrics
    pub messages_fetched: Counter,

    // Classification metrics
    pub messages_classified: CounterVec,

    // Delivery metrics
    pub deliveries: CounterVec,

    // Polling metrics
    pub poll_cycles: CounterVec,
    pub poll_cycle_duration: Histogram,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        let messages_fetched = register_counter_with_registry!(
            Opts::new("triage_messages_fetched_total", "Total messages fetched from the mailbox"),
            registry
        )?;

        let messages_classified = register_counter_vec_with_registry!(
            Opts::new("triage_messages_classified_total", "Total messages classified"),
            &["category"],
            registry
        )?;

        let deliveries = register_counter_vec_with_registry!(
            Opts::new("triage_deliveries_total", "Total delivery attempts to the ingestion API"),
            &["status"],
            registry
        )?;

        let poll_cycles = register_counter_vec_with_registry!(
            Opts::new("triage_poll_cycles_total", "Total polling cycles"),
            &["status"],
            registry
        )?;

        let poll_cycle_duration = register_histogram_with_registry!(
            "triage_poll_cycle_duration_seconds",
            "Polling cycle duration in seconds",
            registry
        )?;

        Ok(Self {
            registry,
            messages_fetched,
            messages_classified,
            deliveries,
            poll_cycles,
            poll_cycle_duration,
        })
    }

    pub fn record_fetched(&self, count: usize) {
        self.messages_fetched.inc_by(count as f64);
    }

    pub fn record_classification(&self, category: &str) {
        self.messages_classified.with_label_values(&[category]).inc();
    }

    pub fn record_delivery(&self, status: &str) {
        self.deliveries.with_label_values(&[status]).inc();
    }

    /// Record a finished polling cycle
    pub fn record_cycle(&self, success: bool, seconds: f64) {
        let status = if success { "success" } else { "error" };
        self.poll_cycles.with_label_values(&[status]).inc();
        self.poll_cycle_duration.observe(seconds);
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap_or_default();

        String::from_utf8(buffer).unwrap_or_default()
    }
}
