//! TokenSwap Exchange
//!
//! The swap settlement engine. It resolves a directed rate, converts the
//! input amount, checks the caller's holdings and the exchange's liquidity,
//! and settles both transfer legs in one ledger transaction.

pub mod config;
pub mod engine;
pub mod events;
pub mod metrics;
pub mod swap;
pub mod telemetry;

pub use config::ExchangeConfig;
pub use engine::SwapEngine;
pub use events::ExchangeEvent;
pub use metrics::{ExchangeMetrics, MetricsSnapshot, SharedMetrics};
pub use swap::{Quote, SwapReceipt, SwapRequest};
