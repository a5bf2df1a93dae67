//! Directional rate registry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokenswap_common::{Address, Result, U256};
use tracing::{debug, info, instrument};

use crate::auth::Authorizer;
use crate::rate::{RatePair, TradingPair};

/// Default capacity of the rate-change broadcast channel.
pub const DEFAULT_UPDATE_CAPACITY: usize = 256;

/// Notification emitted whenever a rate is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateUpdate {
    /// The direction that changed.
    pub pair: TradingPair,
    /// Rate before the write, if one was registered.
    pub previous: Option<RatePair>,
    /// Rate after the write.
    pub current: RatePair,
    /// Administrator that made the change.
    pub updated_by: Address,
    /// When the change was made.
    pub updated_at: DateTime<Utc>,
}

/// Maps ordered token pairs to their rates.
///
/// Entries are created or replaced only by [`RateRegistry::set_rate`] and are
/// never removed. A write swaps in a whole [`RatePair`], so readers see either
/// the old pair or the new one.
pub struct RateRegistry {
    rates: DashMap<TradingPair, RatePair>,
    authorizer: Arc<dyn Authorizer>,
    updates: broadcast::Sender<RateUpdate>,
}

impl RateRegistry {
    /// Create an empty registry guarded by `authorizer`.
    pub fn new(authorizer: Arc<dyn Authorizer>) -> Self {
        Self::with_capacity(authorizer, DEFAULT_UPDATE_CAPACITY)
    }

    /// Create with a custom notification buffer.
    pub fn with_capacity(authorizer: Arc<dyn Authorizer>, update_capacity: usize) -> Self {
        let (updates, _) = broadcast::channel(update_capacity.max(1));
        Self {
            rates: DashMap::new(),
            authorizer,
            updates,
        }
    }

    /// Register or overwrite the rate for `from -> to`.
    ///
    /// Authorization is checked before the rate itself.
    #[instrument(skip(self))]
    pub fn set_rate(
        &self,
        caller: &Address,
        from: Address,
        to: Address,
        from_amount: U256,
        to_amount: U256,
    ) -> Result<RateUpdate> {
        self.authorizer.ensure_administrator(caller)?;
        let rate = RatePair::new(from_amount, to_amount)?;

        let pair = TradingPair::new(from, to);
        let previous = self.rates.insert(pair.clone(), rate);

        info!(
            pair = %pair,
            rate = %rate,
            previous = ?previous.map(|p| p.to_string()),
            "Rate updated"
        );

        let update = RateUpdate {
            pair,
            previous,
            current: rate,
            updated_by: caller.clone(),
            updated_at: Utc::now(),
        };

        // No subscribers is fine.
        if self.updates.send(update.clone()).is_err() {
            debug!(pair = %update.pair, "Rate update dropped, no subscribers");
        }

        Ok(update)
    }

    /// Rate for `from -> to`, or `None` if that direction is not registered.
    pub fn lookup(&self, from: &Address, to: &Address) -> Option<RatePair> {
        let pair = TradingPair::new(from.clone(), to.clone());
        let rate = self.rates.get(&pair).map(|entry| *entry.value());
        debug!(pair = %pair, found = rate.is_some(), "Rate lookup");
        rate
    }

    /// Rate components for `from -> to`; `(0, 0)` means no route.
    pub fn get_rate(&self, from: &Address, to: &Address) -> (U256, U256) {
        self.lookup(from, to)
            .map(|rate| rate.as_tuple())
            .unwrap_or((U256::zero(), U256::zero()))
    }

    /// Whether a rate is registered for `from -> to`.
    pub fn has_route(&self, from: &Address, to: &Address) -> bool {
        self.rates
            .contains_key(&TradingPair::new(from.clone(), to.clone()))
    }

    /// All registered directions with their rates, sorted by pair.
    pub fn pairs(&self) -> Vec<(TradingPair, RatePair)> {
        let mut pairs: Vec<_> = self
            .rates
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs
    }

    /// Number of registered directions.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Check if no rate is registered.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Receive a [`RateUpdate`] for every subsequent write.
    pub fn subscribe(&self) -> broadcast::Receiver<RateUpdate> {
        self.updates.subscribe()
    }

    /// The capability deciding who may write.
    pub fn authorizer(&self) -> &Arc<dyn Authorizer> {
        &self.authorizer
    }
}
