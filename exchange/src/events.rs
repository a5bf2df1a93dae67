//! Notifications published by the exchange.

use serde::Serialize;
use tokenswap_common::Address;
use tokenswap_rates::RateUpdate;

use crate::swap::SwapReceipt;

/// Something observers may want to react to.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExchangeEvent {
    /// Both legs of a swap settled.
    SwapExecuted(SwapReceipt),
    /// A swap failed; no balance changed.
    SwapRejected {
        caller: Address,
        from_token: Address,
        to_token: Address,
        code: &'static str,
        reason: String,
    },
    /// A rate was written through the engine.
    RateUpdated(RateUpdate),
    /// Administration moved to another account.
    OwnershipTransferred { previous: Address, new_owner: Address },
}

impl ExchangeEvent {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ExchangeEvent::SwapExecuted(_) => "swap_executed",
            ExchangeEvent::SwapRejected { .. } => "swap_rejected",
            ExchangeEvent::RateUpdated(_) => "rate_updated",
            ExchangeEvent::OwnershipTransferred { .. } => "ownership_transferred",
        }
    }
}
