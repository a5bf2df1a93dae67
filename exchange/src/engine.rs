//! Swap settlement engine.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, instrument, warn};

use tokenswap_common::{Address, Asset, ExchangeError, Result, SwapId, U256};
use tokenswap_ledger::Ledger;
use tokenswap_rates::{
    convert_with_mode, Authorizer, OwnerAuthorizer, RatePair, RateRegistry, RateUpdate, TradingPair,
};

use crate::config::ExchangeConfig;
use crate::events::ExchangeEvent;
use crate::metrics::{ExchangeMetrics, SharedMetrics};
use crate::swap::{Quote, SwapReceipt, SwapRequest};

/// Settles swaps between a caller and the exchange's own account.
///
/// Swaps, rate writes and ownership changes run one at a time, so a rate
/// can never change between a swap's validation and its settlement. Quotes
/// and rate reads do not wait.
pub struct SwapEngine {
    /// Configuration.
    config: ExchangeConfig,
    /// Rates in force.
    registry: Arc<RateRegistry>,
    /// Balance-and-transfer substrate.
    ledger: Arc<dyn Ledger>,
    /// Present when the engine owns the single-owner admin model.
    ownership: Option<Arc<OwnerAuthorizer>>,
    serial: Mutex<()>,
    events: broadcast::Sender<ExchangeEvent>,
    metrics: SharedMetrics,
}

impl SwapEngine {
    /// Create an engine over an existing registry. Ownership transfer is
    /// unavailable; administration is whatever the registry's authorizer says.
    pub fn new(config: ExchangeConfig, registry: Arc<RateRegistry>, ledger: Arc<dyn Ledger>) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));

        Self {
            config,
            registry,
            ledger,
            ownership: None,
            serial: Mutex::new(()),
            events,
            metrics: Arc::new(ExchangeMetrics::new()),
        }
    }

    /// Create an engine administered by `config.administrator` alone.
    pub fn with_owner(config: ExchangeConfig, ledger: Arc<dyn Ledger>) -> Self {
        let owner = Arc::new(OwnerAuthorizer::new(config.administrator.clone()));
        let authorizer: Arc<dyn Authorizer> = owner.clone();
        let registry = Arc::new(RateRegistry::with_capacity(authorizer, config.event_capacity));

        let mut engine = Self::new(config, registry, ledger);
        engine.ownership = Some(owner);
        engine
    }

    /// Register or overwrite the rate for `from -> to`. Administrator only.
    #[instrument(skip(self))]
    pub async fn set_rate(
        &self,
        caller: &Address,
        from: Address,
        to: Address,
        from_amount: U256,
        to_amount: U256,
    ) -> Result<RateUpdate> {
        let _serial = self.serial.lock().await;

        let update = self
            .registry
            .set_rate(caller, from, to, from_amount, to_amount)?;
        self.metrics.rate_updated();
        self.publish(ExchangeEvent::RateUpdated(update.clone()));

        Ok(update)
    }

    /// Rate components for `from -> to`; `(0, 0)` means no route.
    pub fn get_rate(&self, from: &Address, to: &Address) -> (U256, U256) {
        self.registry.get_rate(from, to)
    }

    /// Rate for `from -> to`, if registered.
    pub fn lookup_rate(&self, from: &Address, to: &Address) -> Option<RatePair> {
        self.registry.lookup(from, to)
    }

    /// Resolve the route and convert `amount` without touching any balance.
    ///
    /// Fails with the same route and amount errors a swap would.
    pub fn quote(&self, from: &Address, to: &Address, amount: U256) -> Result<Quote> {
        let rate = self.registry.lookup(from, to).ok_or_else(|| ExchangeError::NoRoute {
            from: from.clone(),
            to: to.clone(),
        })?;

        if amount.is_zero() {
            return Err(ExchangeError::InvalidAmount);
        }

        let amount_out = convert_with_mode(amount, &rate, self.config.rounding).map_err(|e| {
            debug!(amount = %amount, rate = %rate, error = %e, "Conversion rejected");
            e
        })?;

        Ok(Quote {
            pair: TradingPair::new(from.clone(), to.clone()),
            rate,
            amount_in: amount,
            amount_out,
            price: rate.price(),
        })
    }

    /// Exchange the caller's input token for the output token at the
    /// registered rate. Either both legs settle or no balance changes.
    #[instrument(
        skip(self, request),
        fields(caller = %request.caller, from = %request.from_token, to = %request.to_token)
    )]
    pub async fn swap(&self, request: SwapRequest) -> Result<SwapReceipt> {
        self.metrics.swap_attempted();
        let _serial = self.serial.lock().await;

        match self.settle(&request).await {
            Ok(receipt) => {
                self.metrics.swap_settled();
                info!(
                    swap_id = %receipt.id,
                    amount_in = %receipt.amount_in,
                    amount_out = %receipt.amount_out,
                    "Swap settled"
                );
                self.publish(ExchangeEvent::SwapExecuted(receipt.clone()));
                Ok(receipt)
            }
            Err(e) => {
                self.metrics.swap_rejected(e.error_code());
                warn!(code = e.error_code(), error = %e, "Swap rejected");
                self.publish(ExchangeEvent::SwapRejected {
                    caller: request.caller.clone(),
                    from_token: request.from_token.clone(),
                    to_token: request.to_token.clone(),
                    code: e.error_code(),
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Hand administration to `new_owner`. Only available on engines built
    /// with [`SwapEngine::with_owner`].
    #[instrument(skip(self))]
    pub async fn transfer_ownership(&self, caller: &Address, new_owner: Address) -> Result<Address> {
        let ownership = self.ownership.as_ref().ok_or_else(|| {
            ExchangeError::Configuration("ownership is not managed by this engine".to_string())
        })?;

        let _serial = self.serial.lock().await;
        let previous = ownership.transfer_ownership(caller, new_owner.clone())?;
        self.publish(ExchangeEvent::OwnershipTransferred {
            previous: previous.clone(),
            new_owner,
        });

        Ok(previous)
    }

    /// Current owner, for engines built with [`SwapEngine::with_owner`].
    pub fn owner(&self) -> Option<Address> {
        self.ownership.as_ref().map(|o| o.owner())
    }

    /// What the exchange holds of `token` and can pay out.
    pub async fn liquidity(&self, token: &Address) -> Result<U256> {
        self.ledger
            .balance_of(&Asset::from(token), &self.config.engine_account)
            .await
    }

    /// Receive every subsequent [`ExchangeEvent`].
    pub fn subscribe(&self) -> broadcast::Receiver<ExchangeEvent> {
        self.events.subscribe()
    }

    /// Account that acts as counterparty.
    pub fn engine_account(&self) -> &Address {
        &self.config.engine_account
    }

    /// Get the configuration.
    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Every registered pair, sorted. Rates change only through [`Self::set_rate`].
    pub fn pairs(&self) -> Vec<(TradingPair, RatePair)> {
        self.registry.pairs()
    }

    /// Get the metrics handle.
    pub fn metrics(&self) -> SharedMetrics {
        self.metrics.clone()
    }

    // --- Private methods ---

    async fn settle(&self, request: &SwapRequest) -> Result<SwapReceipt> {
        let quote = self.quote(&request.from_token, &request.to_token, request.input_amount())?;
        let engine = &self.config.engine_account;

        // Allowance is enforced by the ledger when the first leg moves.
        let source = Asset::from(&request.from_token);
        let held = self.ledger.balance_of(&source, &request.caller).await?;
        if held < quote.amount_in {
            debug!(held = %held, required = %quote.amount_in, "Caller balance short");
            return Err(ExchangeError::InsufficientCallerFunds);
        }

        let destination = Asset::from(&request.to_token);
        let liquidity = self.ledger.balance_of(&destination, engine).await?;
        if liquidity < quote.amount_out {
            debug!(liquidity = %liquidity, required = %quote.amount_out, "Liquidity short");
            return Err(ExchangeError::InsufficientLiquidity);
        }

        let tx = self.ledger.begin().await?;
        let settled = match self.move_legs(request, &quote).await {
            Ok(()) => self.ledger.commit(tx).await,
            Err(e) => Err(e),
        };

        if let Err(e) = settled {
            self.metrics.swap_rolled_back();
            if let Err(rollback_err) = self.ledger.rollback(tx).await {
                error!(tx = %tx, error = %rollback_err, "Rollback failed");
            }
            return Err(e);
        }

        Ok(SwapReceipt {
            id: SwapId::new(),
            transaction_id: tx,
            caller: request.caller.clone(),
            from_token: request.from_token.clone(),
            to_token: request.to_token.clone(),
            amount_in: quote.amount_in,
            amount_out: quote.amount_out,
            executed_at: Utc::now(),
        })
    }

    /// Debit the caller, then credit the caller.
    async fn move_legs(&self, request: &SwapRequest, quote: &Quote) -> Result<()> {
        let engine = &self.config.engine_account;

        if request.is_native_source() {
            self.ledger
                .transfer_native(&request.caller, engine, quote.amount_in)
                .await?;
        } else {
            self.ledger
                .transfer_from(&request.from_token, engine, &request.caller, engine, quote.amount_in)
                .await?;
        }

        if request.to_token.is_native() {
            self.ledger
                .transfer_native(engine, &request.caller, quote.amount_out)
                .await
        } else {
            self.ledger
                .transfer(&request.to_token, engine, &request.caller, quote.amount_out)
                .await
        }
    }

    fn publish(&self, event: ExchangeEvent) {
        let kind = event.kind();
        // No subscribers is fine.
        if self.events.send(event).is_err() {
            debug!(kind, "Event dropped, no subscribers");
        }
    }
}
