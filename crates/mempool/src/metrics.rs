//! Prometheus instrumentation for the staging subsystem.
//!
//! Each mempool and sidecar instance owns a [`Metrics`] set; pass the same
//! registry to both and namespace them apart. Metrics are created
//! unregistered so tests can instantiate subsystems without a registry.

use prometheus::{
    exponential_buckets, Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry,
};

/// Metrics tracked by one staging subsystem instance.
#[derive(Clone)]
pub struct Metrics {
    /// Number of transactions currently held
    pub size: IntGauge,
    /// Observed wire sizes of admitted transactions
    pub tx_size_bytes: Histogram,
    /// Transactions rejected by a check or evicted on recheck
    pub failed_txs: IntCounter,
    /// Completed recheck rounds
    pub recheck_times: IntCounter,
}

impl Metrics {
    /// Creates an unregistered metric set under `namespace`.
    pub fn new(namespace: &str) -> std::result::Result<Self, prometheus::Error> {
        Ok(Self {
            size: IntGauge::with_opts(
                Opts::new("size", "Number of staged transactions.")
                    .namespace(namespace.to_string()),
            )?,
            tx_size_bytes: Histogram::with_opts(
                HistogramOpts::new("tx_size_bytes", "Wire sizes of admitted transactions.")
                    .namespace(namespace.to_string())
                    .buckets(exponential_buckets(1.0, 3.0, 17)?),
            )?,
            failed_txs: IntCounter::with_opts(
                Opts::new("failed_txs", "Transactions that failed a check.")
                    .namespace(namespace.to_string()),
            )?,
            recheck_times: IntCounter::with_opts(
                Opts::new("recheck_times", "Completed recheck rounds.")
                    .namespace(namespace.to_string()),
            )?,
        })
    }

    /// Registers all collectors on `registry`.
    pub fn register(&self, registry: &Registry) -> std::result::Result<(), prometheus::Error> {
        registry.register(Box::new(self.size.clone()))?;
        registry.register(Box::new(self.tx_size_bytes.clone()))?;
        registry.register(Box::new(self.failed_txs.clone()))?;
        registry.register(Box::new(self.recheck_times.clone()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_register() {
        let registry = Registry::new();
        let metrics = Metrics::new("forge_mempool").unwrap();
        metrics.register(&registry).unwrap();

        metrics.size.set(3);
        metrics.tx_size_bytes.observe(22.0);
        metrics.failed_txs.inc();

        let families = registry.gather();
        assert_eq!(families.len(), 4);
        assert!(families
            .iter()
            .any(|f| f.get_name() == "forge_mempool_size"));
    }

    #[test]
    fn test_namespaces_do_not_collide() {
        let registry = Registry::new();
        Metrics::new("forge_mempool")
            .unwrap()
            .register(&registry)
            .unwrap();
        Metrics::new("forge_sidecar")
            .unwrap()
            .register(&registry)
            .unwrap();
        assert_eq!(registry.gather().len(), 8);
    }
}
