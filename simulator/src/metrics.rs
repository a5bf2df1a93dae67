//! Simulation metrics.

use std::collections::BTreeMap;

use serde::Serialize;
use tokenswap_common::{serde_u256, Result as ExchangeResult, U256};
use tokenswap_exchange::SwapReceipt;

/// Settled volume through one direction.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PairVolume {
    pub swaps: u64,
    #[serde(with = "serde_u256")]
    pub amount_in: U256,
    #[serde(with = "serde_u256")]
    pub amount_out: U256,
}

/// Nearest-rank latency summary over one set of samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LatencyStats {
    pub count: usize,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

impl LatencyStats {
    fn from_samples(samples: &[u64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let mut sorted = samples.to_vec();
        sorted.sort_unstable();
        let rank = |p: usize| sorted[(sorted.len() * p).div_ceil(100).max(1) - 1];

        Self {
            count: sorted.len(),
            mean_us: sorted.iter().sum::<u64>() / sorted.len() as u64,
            p50_us: rank(50),
            p99_us: rank(99),
            max_us: sorted[sorted.len() - 1],
        }
    }
}

/// End-of-run report, printed as JSON by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationSummary {
    pub total_swaps: u64,
    pub settled_swaps: u64,
    pub rejected_swaps: u64,
    pub success_rate: f64,
    pub settled_latency: LatencyStats,
    pub rejected_latency: LatencyStats,
    pub rejections: BTreeMap<String, u64>,
    pub volume: BTreeMap<String, PairVolume>,
}

/// Outcomes of every swap the simulator submitted.
#[derive(Debug, Clone, Default)]
pub struct SimulationMetrics {
    /// Swaps submitted.
    pub total_swaps: u64,
    /// Swaps that settled.
    pub settled_swaps: u64,
    /// Swaps that were rejected.
    pub rejected_swaps: u64,
    /// Rejections by error code.
    pub rejections: BTreeMap<String, u64>,
    /// Settled volume keyed by `from->to`.
    pub volume: BTreeMap<String, PairVolume>,
    settled_latency_us: Vec<u64>,
    rejected_latency_us: Vec<u64>,
}

impl SimulationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one swap and how long the engine took.
    pub fn record(&mut self, outcome: &ExchangeResult<SwapReceipt>, latency_us: u64) {
        self.total_swaps += 1;

        match outcome {
            Ok(receipt) => {
                self.settled_swaps += 1;
                self.settled_latency_us.push(latency_us);

                let key = format!("{}->{}", receipt.from_token, receipt.to_token);
                let volume = self.volume.entry(key).or_default();
                volume.swaps += 1;
                volume.amount_in = volume.amount_in.saturating_add(receipt.amount_in);
                volume.amount_out = volume.amount_out.saturating_add(receipt.amount_out);
            }
            Err(e) => {
                self.rejected_swaps += 1;
                self.rejected_latency_us.push(latency_us);
                *self.rejections.entry(e.error_code().to_string()).or_insert(0) += 1;
            }
        }
    }

    /// Fraction of submitted swaps that settled.
    pub fn success_rate(&self) -> f64 {
        if self.total_swaps == 0 {
            return 0.0;
        }
        self.settled_swaps as f64 / self.total_swaps as f64
    }

    pub fn summary(&self) -> SimulationSummary {
        SimulationSummary {
            total_swaps: self.total_swaps,
            settled_swaps: self.settled_swaps,
            rejected_swaps: self.rejected_swaps,
            success_rate: self.success_rate(),
            settled_latency: LatencyStats::from_samples(&self.settled_latency_us),
            rejected_latency: LatencyStats::from_samples(&self.rejected_latency_us),
            rejections: self.rejections.clone(),
            volume: self.volume.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tokenswap_common::{Address, ExchangeError, SwapId, TransactionId};

    fn receipt(amount_in: u64, amount_out: u64) -> SwapReceipt {
        SwapReceipt {
            id: SwapId::new(),
            transaction_id: TransactionId::new(),
            caller: Address::new("alice"),
            from_token: Address::new("usdt"),
            to_token: Address::new("pkf"),
            amount_in: U256::from(amount_in),
            amount_out: U256::from(amount_out),
            executed_at: Utc::now(),
        }
    }

    #[test]
    fn test_record_outcomes() {
        let mut metrics = SimulationMetrics::new();

        metrics.record(&Ok(receipt(10, 20)), 100);
        metrics.record(&Ok(receipt(5, 10)), 200);
        metrics.record(&Ok(receipt(1, 2)), 150);
        metrics.record(&Err(ExchangeError::InsufficientLiquidity), 40);

        assert_eq!(metrics.total_swaps, 4);
        assert_eq!(metrics.settled_swaps, 3);
        assert_eq!(metrics.rejected_swaps, 1);
        assert_eq!(metrics.success_rate(), 0.75);
        assert_eq!(metrics.rejections.get("INSUFFICIENT_LIQUIDITY"), Some(&1));

        let volume = &metrics.volume["usdt->pkf"];
        assert_eq!(volume.swaps, 3);
        assert_eq!(volume.amount_in, U256::from(16u64));
        assert_eq!(volume.amount_out, U256::from(32u64));
    }

    #[test]
    fn test_latency_stats() {
        let stats = LatencyStats::from_samples(&[200, 100, 150]);
        assert_eq!(
            stats,
            LatencyStats {
                count: 3,
                mean_us: 150,
                p50_us: 150,
                p99_us: 200,
                max_us: 200,
            }
        );
        assert_eq!(LatencyStats::from_samples(&[]), LatencyStats::default());
    }

    #[test]
    fn test_summary_serializes_amounts_as_strings() {
        let mut metrics = SimulationMetrics::new();
        metrics.record(&Ok(receipt(10, 20)), 100);
        metrics.record(&Err(ExchangeError::InvalidAmount), 5);

        let json = serde_json::to_value(metrics.summary()).unwrap();
        assert_eq!(json["volume"]["usdt->pkf"]["amount_out"], "20");
        assert_eq!(json["rejected_latency"]["count"], 1);
        assert_eq!(json["rejections"]["INVALID_AMOUNT"], 1);
    }
}
