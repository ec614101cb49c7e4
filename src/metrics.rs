//! Prometheus metrics for the store and its HTTP surface.

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

use crate::store::registry::StoreStats;

/// Counters and gauges exported at `/metrics`.
#[derive(Clone)]
pub struct StoreMetrics {
    registry: Registry,

    /// Successful store operations.
    pub puts_total: IntCounter,
    /// Failed store operations (any cause).
    pub put_failures_total: IntCounter,
    /// Successful loads, size queries included.
    pub loads_total: IntCounter,
    /// Failed loads (absent, too small, fault).
    pub load_failures_total: IntCounter,

    /// Number of stored weights.
    pub blobs: IntGauge,
    /// Sum of stored blob lengths in bytes.
    pub bytes_stored: IntGauge,
    /// Pages held by stored blobs.
    pub pages_live: IntGauge,
}

impl StoreMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let puts_total =
            IntCounter::new("weightstore_puts_total", "Successful weight stores")?;
        let put_failures_total =
            IntCounter::new("weightstore_put_failures_total", "Failed weight stores")?;
        let loads_total =
            IntCounter::new("weightstore_loads_total", "Successful weight loads")?;
        let load_failures_total =
            IntCounter::new("weightstore_load_failures_total", "Failed weight loads")?;
        let blobs = IntGauge::new("weightstore_blobs", "Number of stored weights")?;
        let bytes_stored =
            IntGauge::new("weightstore_bytes_stored", "Total stored bytes")?;
        let pages_live =
            IntGauge::new("weightstore_pages_live", "Pages held by stored weights")?;

        registry.register(Box::new(puts_total.clone()))?;
        registry.register(Box::new(put_failures_total.clone()))?;
        registry.register(Box::new(loads_total.clone()))?;
        registry.register(Box::new(load_failures_total.clone()))?;
        registry.register(Box::new(blobs.clone()))?;
        registry.register(Box::new(bytes_stored.clone()))?;
        registry.register(Box::new(pages_live.clone()))?;

        Ok(Self {
            registry,
            puts_total,
            put_failures_total,
            loads_total,
            load_failures_total,
            blobs,
            bytes_stored,
            pages_live,
        })
    }

    /// Refresh the gauges from a store snapshot.
    pub fn observe_store(&self, stats: &StoreStats) {
        self.blobs.set(stats.blobs as i64);
        self.bytes_stored.set(stats.bytes_stored as i64);
        self.pages_live.set(stats.pages_live as i64);
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
