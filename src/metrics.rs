//! Metrics collection and export module

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::time::Instant;

/// SDK metrics registry. Components take an `Option<Arc<SdkMetrics>>` and
/// record nothing when it is absent.
pub struct SdkMetrics {
    registry: Registry,

    // Counters
    pub cycles_total: IntCounter,
    pub cycles_failed: IntCounterVec,
    pub transactions_submitted: IntCounter,
    pub transactions_confirmed: IntCounter,
    pub confirmation_timeouts: IntCounter,
    pub transport_retries: IntCounter,
    pub compile_cache_hits: IntCounter,
    pub compile_cache_misses: IntCounter,

    // Histograms
    pub cycle_latency: Histogram,
    pub node_latency: Histogram,
}

impl SdkMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let cycles_total = IntCounter::with_opts(Opts::new(
            "composer_cycles_total",
            "Number of composer send cycles started",
        ))?;

        let cycles_failed = IntCounterVec::new(
            Opts::new("composer_cycles_failed", "Composer cycles that returned an error"),
            &["category"],
        )?;

        let transactions_submitted = IntCounter::with_opts(Opts::new(
            "transactions_submitted_total",
            "Transactions accepted by the node",
        ))?;

        let transactions_confirmed = IntCounter::with_opts(Opts::new(
            "transactions_confirmed_total",
            "Transactions observed in a confirmed round",
        ))?;

        let confirmation_timeouts = IntCounter::with_opts(Opts::new(
            "confirmation_timeouts_total",
            "Transactions whose confirmation budget ran out",
        ))?;

        let transport_retries = IntCounter::with_opts(Opts::new(
            "transport_retries_total",
            "Node requests retried after a transient failure",
        ))?;

        let compile_cache_hits = IntCounter::with_opts(Opts::new(
            "compile_cache_hits_total",
            "Program compilations served from cache",
        ))?;

        let compile_cache_misses = IntCounter::with_opts(Opts::new(
            "compile_cache_misses_total",
            "Program compilations sent to the node",
        ))?;

        let cycle_latency = Histogram::with_opts(
            HistogramOpts::new("composer_cycle_seconds", "Composer send latency, submission to last confirmation")
                .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        )?;

        let node_latency = Histogram::with_opts(
            HistogramOpts::new("node_request_seconds", "Node request latency including retries")
                .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;

        registry.register(Box::new(cycles_total.clone()))?;
        registry.register(Box::new(cycles_failed.clone()))?;
        registry.register(Box::new(transactions_submitted.clone()))?;
        registry.register(Box::new(transactions_confirmed.clone()))?;
        registry.register(Box::new(confirmation_timeouts.clone()))?;
        registry.register(Box::new(transport_retries.clone()))?;
        registry.register(Box::new(compile_cache_hits.clone()))?;
        registry.register(Box::new(compile_cache_misses.clone()))?;
        registry.register(Box::new(cycle_latency.clone()))?;
        registry.register(Box::new(node_latency.clone()))?;

        Ok(Self {
            registry,
            cycles_total,
            cycles_failed,
            transactions_submitted,
            transactions_confirmed,
            confirmation_timeouts,
            transport_retries,
            compile_cache_hits,
            compile_cache_misses,
            cycle_latency,
            node_latency,
        })
    }

    /// Get the registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Prometheus text exposition of everything registered
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Timer helper for measuring operation duration
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn observe_duration(&self, histogram: &Histogram) {
        histogram.observe(self.elapsed_secs());
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_register_and_render() {
        let metrics = SdkMetrics::new().unwrap();
        metrics.cycles_total.inc();
        metrics.cycles_failed.with_label_values(&["signing"]).inc();
        metrics.transport_retries.inc_by(2);

        let text = metrics.render().unwrap();
        assert!(text.contains("composer_cycles_total 1"));
        assert!(text.contains("transport_retries_total 2"));
        assert!(text.contains("category=\"signing\""));
    }

    #[test]
    fn test_independent_registries() {
        let a = SdkMetrics::new().unwrap();
        let b = SdkMetrics::new().unwrap();
        a.compile_cache_hits.inc();
        assert_eq!(a.compile_cache_hits.get(), 1);
        assert_eq!(b.compile_cache_hits.get(), 0);
    }
}
