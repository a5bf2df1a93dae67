//! Metrics collection for exchange monitoring.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;

/// Exchange metrics.
#[derive(Default)]
pub struct ExchangeMetrics {
    /// Swaps submitted.
    pub swaps_attempted: AtomicU64,
    /// Swaps that settled both legs.
    pub swaps_settled: AtomicU64,
    /// Swaps that failed for any reason.
    pub swaps_rejected: AtomicU64,
    /// Swaps that failed after the ledger transaction was opened.
    pub swaps_rolled_back: AtomicU64,
    /// Successful rate writes.
    pub rate_updates: AtomicU64,
    /// Rejections keyed by error code.
    rejections: DashMap<&'static str, u64>,
}

impl ExchangeMetrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a submitted swap.
    pub fn swap_attempted(&self) {
        self.swaps_attempted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a settled swap.
    pub fn swap_settled(&self) {
        self.swaps_settled.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rejected swap under its error code.
    pub fn swap_rejected(&self, code: &'static str) {
        self.swaps_rejected.fetch_add(1, Ordering::Relaxed);
        *self.rejections.entry(code).or_insert(0) += 1;
    }

    /// Record a ledger rollback.
    pub fn swap_rolled_back(&self) {
        self.swaps_rolled_back.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rate write.
    pub fn rate_updated(&self) {
        self.rate_updates.fetch_add(1, Ordering::Relaxed);
    }

    /// Rejections recorded for `code`.
    pub fn rejections_for(&self, code: &str) -> u64 {
        self.rejections.get(code).map(|count| *count).unwrap_or(0)
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            swaps_attempted: self.swaps_attempted.load(Ordering::Relaxed),
            swaps_settled: self.swaps_settled.load(Ordering::Relaxed),
            swaps_rejected: self.swaps_rejected.load(Ordering::Relaxed),
            swaps_rolled_back: self.swaps_rolled_back.load(Ordering::Relaxed),
            rate_updates: self.rate_updates.load(Ordering::Relaxed),
            rejections: self
                .rejections
                .iter()
                .map(|entry| (entry.key().to_string(), *entry.value()))
                .collect(),
        }
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        let mut out = format!(
            r#"# HELP tokenswap_swaps_attempted Total swaps submitted
# TYPE tokenswap_swaps_attempted counter
tokenswap_swaps_attempted {}

# HELP tokenswap_swaps_settled Total swaps settled
# TYPE tokenswap_swaps_settled counter
tokenswap_swaps_settled {}

# HELP tokenswap_swaps_rejected Total swaps rejected
# TYPE tokenswap_swaps_rejected counter
tokenswap_swaps_rejected {}

# HELP tokenswap_swaps_rolled_back Total swaps rolled back during settlement
# TYPE tokenswap_swaps_rolled_back counter
tokenswap_swaps_rolled_back {}

# HELP tokenswap_rate_updates Total rate writes
# TYPE tokenswap_rate_updates counter
tokenswap_rate_updates {}

# HELP tokenswap_swap_rejections Swap rejections by error code
# TYPE tokenswap_swap_rejections counter
"#,
            snapshot.swaps_attempted,
            snapshot.swaps_settled,
            snapshot.swaps_rejected,
            snapshot.swaps_rolled_back,
            snapshot.rate_updates,
        );

        for (code, count) in &snapshot.rejections {
            out.push_str(&format!(
                "tokenswap_swap_rejections{{code=\"{}\"}} {}\n",
                code, count
            ));
        }

        out
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub swaps_attempted: u64,
    pub swaps_settled: u64,
    pub swaps_rejected: u64,
    pub swaps_rolled_back: u64,
    pub rate_updates: u64,
    /// Sorted by error code.
    pub rejections: BTreeMap<String, u64>,
}

/// Shared metrics instance.
pub type SharedMetrics = Arc<ExchangeMetrics>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_increment() {
        let metrics = ExchangeMetrics::new();

        metrics.swap_attempted();
        metrics.swap_attempted();
        metrics.swap_settled();
        metrics.swap_rejected("NO_ROUTE");

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.swaps_attempted, 2);
        assert_eq!(snapshot.swaps_settled, 1);
        assert_eq!(snapshot.swaps_rejected, 1);
        assert_eq!(snapshot.rejections.get("NO_ROUTE"), Some(&1));
        assert_eq!(metrics.rejections_for("INVALID_AMOUNT"), 0);
    }

    #[test]
    fn test_prometheus_export() {
        let metrics = ExchangeMetrics::new();
        metrics.swap_attempted();
        metrics.swap_rejected("INSUFFICIENT_LIQUIDITY");

        let output = metrics.to_prometheus();
        assert!(output.contains("tokenswap_swaps_attempted 1"));
        assert!(output.contains("tokenswap_swap_rejections{code=\"INSUFFICIENT_LIQUIDITY\"} 1"));
    }

    #[test]
    fn test_snapshot_serializes() {
        let metrics = ExchangeMetrics::new();
        metrics.rate_updated();
        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["rate_updates"], 1);
    }
}
