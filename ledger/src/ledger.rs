//! The ledger capability consumed by the settlement engine.

use async_trait::async_trait;
use tokenswap_common::{Address, Asset, Result, TransactionId, U256};

/// Per-token balance and allowance state, and the only primitives that move value.
///
/// Every call either completes or fails without effect. Calls made between
/// [`Ledger::begin`] and [`Ledger::commit`] form one unit of work that
/// [`Ledger::rollback`] undoes entirely.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Balance of `account` in `asset` (native balances via [`Asset::Native`]).
    async fn balance_of(&self, asset: &Asset, account: &Address) -> Result<U256>;

    /// Amount `spender` may still move out of `owner`'s `token` balance.
    async fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> Result<U256>;

    /// Move `amount` of `token` from `from` to `to` on behalf of `spender`,
    /// consuming allowance.
    async fn transfer_from(
        &self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: U256,
    ) -> Result<()>;

    /// Move `amount` of `token` out of `from`'s own balance.
    async fn transfer(&self, token: &Address, from: &Address, to: &Address, amount: U256)
        -> Result<()>;

    /// Move native currency; the value-attachment primitive.
    async fn transfer_native(&self, from: &Address, to: &Address, amount: U256) -> Result<()>;

    /// Open a unit of work.
    async fn begin(&self) -> Result<TransactionId>;

    /// Make every change since `begin` permanent.
    async fn commit(&self, tx: TransactionId) -> Result<()>;

    /// Discard every change since `begin`.
    async fn rollback(&self, tx: TransactionId) -> Result<()>;
}
