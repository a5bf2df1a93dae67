//! Swap request, quote and receipt types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokenswap_common::{serde_u256, Address, SwapId, TransactionId, U256};
use tokenswap_rates::{RatePair, TradingPair};

/// A request to exchange one token for another. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequest {
    /// Account giving `from_token` and receiving `to_token`.
    pub caller: Address,
    /// Token given, or the native sentinel.
    pub from_token: Address,
    /// Token received, or the native sentinel.
    pub to_token: Address,
    /// Amount of `from_token` for ledger-token sources.
    #[serde(with = "serde_u256")]
    pub amount: U256,
    /// Native value attached to the call.
    #[serde(with = "serde_u256", default)]
    pub attached_native: U256,
}

impl SwapRequest {
    /// Swap `amount` of a ledger token.
    pub fn new(caller: Address, from_token: Address, to_token: Address, amount: U256) -> Self {
        Self {
            caller,
            from_token,
            to_token,
            amount,
            attached_native: U256::zero(),
        }
    }

    /// Swap native currency supplied as attached value.
    pub fn native(caller: Address, to_token: Address, attached_native: U256) -> Self {
        Self {
            caller,
            from_token: Address::native(),
            to_token,
            amount: U256::zero(),
            attached_native,
        }
    }

    /// Attach native value.
    pub fn with_attached_native(mut self, value: U256) -> Self {
        self.attached_native = value;
        self
    }

    /// Whether the source leg is the native currency.
    pub fn is_native_source(&self) -> bool {
        self.from_token.is_native()
    }

    /// The amount actually traded: attached value for a native source,
    /// `amount` otherwise.
    pub fn input_amount(&self) -> U256 {
        if self.is_native_source() {
            self.attached_native
        } else {
            self.amount
        }
    }
}

/// Outcome of route resolution and conversion, without touching balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    /// Direction quoted.
    pub pair: TradingPair,
    /// Rate in force when quoted.
    pub rate: RatePair,
    /// Input in source base units.
    #[serde(with = "serde_u256")]
    pub amount_in: U256,
    /// Output in destination base units.
    #[serde(with = "serde_u256")]
    pub amount_out: U256,
    /// Display price; `None` for rates too wide for a decimal.
    pub price: Option<Decimal>,
}

/// Record of a settled swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapReceipt {
    /// Unique swap ID.
    pub id: SwapId,
    /// Ledger transaction both legs settled in.
    pub transaction_id: TransactionId,
    pub caller: Address,
    pub from_token: Address,
    pub to_token: Address,
    /// Debited from the caller.
    #[serde(with = "serde_u256")]
    pub amount_in: U256,
    /// Credited to the caller.
    #[serde(with = "serde_u256")]
    pub amount_out: U256,
    pub executed_at: DateTime<Utc>,
}
