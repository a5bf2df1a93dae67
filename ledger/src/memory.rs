//! In-memory ledger with undo-log rollback.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokenswap_common::{Address, Asset, ExchangeError, Result, TransactionId, U256};
use tracing::{debug, info, instrument, warn};

use crate::journal::{JournalBatch, JournalEntry};
use crate::ledger::Ledger;

/// Balances, allowances and the journal.
#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<(Asset, Address), U256>,
    /// Keyed by (token, owner, spender).
    allowances: HashMap<(Address, Address, Address), U256>,
    journal: Vec<JournalEntry>,
}

impl LedgerState {
    fn balance(&self, asset: &Asset, account: &Address) -> U256 {
        self.balances
            .get(&(asset.clone(), account.clone()))
            .copied()
            .unwrap_or_default()
    }

    fn set_balance(&mut self, asset: &Asset, account: &Address, value: U256) {
        self.balances.insert((asset.clone(), account.clone()), value);
    }

    fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> U256 {
        self.allowances
            .get(&(token.clone(), owner.clone(), spender.clone()))
            .copied()
            .unwrap_or_default()
    }

    /// Move value between two accounts, writing a debit and a credit.
    /// Nothing is written unless both sides succeed.
    fn move_balance(
        &mut self,
        asset: &Asset,
        from: &Address,
        to: &Address,
        amount: U256,
        tx: Option<TransactionId>,
    ) -> Result<()> {
        let from_before = self.balance(asset, from);
        let from_after = from_before
            .checked_sub(amount)
            .ok_or(ExchangeError::InsufficientBalance)?;

        let to_after = if from == to {
            from_before
        } else {
            self.balance(asset, to)
                .checked_add(amount)
                .ok_or_else(|| ExchangeError::BalanceOverflow(to.clone()))?
        };

        if from == to {
            self.journal.push(JournalEntry::debit(tx, from.clone(), asset.clone(), amount, from_after));
        } else {
            self.set_balance(asset, from, from_after);
            self.set_balance(asset, to, to_after);
            self.journal.push(JournalEntry::debit(tx, from.clone(), asset.clone(), amount, from_after));
        }
        self.journal.push(JournalEntry::credit(tx, to.clone(), asset.clone(), amount, to_after));

        Ok(())
    }
}

/// A change made under an open transaction, in a form that can be reversed.
#[derive(Debug)]
enum Undo {
    Move {
        asset: Asset,
        from: Address,
        to: Address,
        amount: U256,
    },
    Allowance {
        key: (Address, Address, Address),
        before: U256,
        after: U256,
    },
}

#[derive(Debug)]
struct OpenTransaction {
    id: TransactionId,
    undo: Vec<Undo>,
}

#[derive(Debug, Default)]
struct Inner {
    state: LedgerState,
    open: Option<OpenTransaction>,
    committed: Vec<TransactionId>,
}

impl Inner {
    fn current_tx(&self) -> Option<TransactionId> {
        self.open.as_ref().map(|open| open.id)
    }

    fn log(&mut self, entry: Undo) {
        if let Some(open) = self.open.as_mut() {
            open.undo.push(entry);
        }
    }

    /// Reverse the logged changes of `open`, newest first.
    ///
    /// Only balances and allowances the transaction touched are written, so
    /// mints and approvals made meanwhile survive. Nothing is written if any
    /// reversal would overflow.
    fn unwind(&mut self, open: &OpenTransaction) -> Result<()> {
        let mut staged: HashMap<(Asset, Address), U256> = HashMap::new();

        for entry in open.undo.iter().rev() {
            let Undo::Move { asset, from, to, amount } = entry else {
                continue;
            };
            let to_key = (asset.clone(), to.clone());
            let to_now = staged
                .get(&to_key)
                .copied()
                .unwrap_or_else(|| self.state.balance(asset, to));
            let to_before = to_now.checked_sub(*amount).ok_or_else(|| {
                ExchangeError::Transaction(format!("cannot reverse credit to {}", to))
            })?;
            staged.insert(to_key, to_before);

            let from_key = (asset.clone(), from.clone());
            let from_now = staged
                .get(&from_key)
                .copied()
                .unwrap_or_else(|| self.state.balance(asset, from));
            let from_before = from_now
                .checked_add(*amount)
                .ok_or_else(|| ExchangeError::BalanceOverflow(from.clone()))?;
            staged.insert(from_key, from_before);
        }

        self.state.balances.extend(staged);

        for entry in open.undo.iter().rev() {
            if let Undo::Allowance { key, before, after } = entry {
                // A newer approval replaces the allowance outright and wins.
                if self.state.allowances.get(key).copied().unwrap_or_default() == *after {
                    self.state.allowances.insert(key.clone(), *before);
                }
            }
        }

        self.state
            .journal
            .retain(|e| e.transaction_id != Some(open.id));
        Ok(())
    }
}

/// A ledger held entirely in memory.
///
/// Token contracts are not modelled separately: a token exists as soon as
/// some account holds a balance of it.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    inner: Mutex<Inner>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` of `asset` to `account` out of thin air.
    ///
    /// Minting is never part of an open transaction and survives its rollback.
    pub fn mint(&self, asset: &Asset, account: &Address, amount: U256) -> Result<U256> {
        let mut inner = self.inner.lock();
        let after = inner
            .state
            .balance(asset, account)
            .checked_add(amount)
            .ok_or_else(|| ExchangeError::BalanceOverflow(account.clone()))?;
        inner.state.set_balance(asset, account, after);
        inner
            .state
            .journal
            .push(JournalEntry::credit(None, account.clone(), asset.clone(), amount, after));

        debug!(asset = %asset, account = %account, amount = %amount, "Minted");
        Ok(after)
    }

    /// Credit `amount` of `token` to `account`.
    pub fn mint_token(&self, token: &Address, account: &Address, amount: U256) -> Result<U256> {
        self.mint(&Asset::from(token), account, amount)
    }

    /// Credit `amount` of native currency to `account`.
    pub fn mint_native(&self, account: &Address, amount: U256) -> Result<U256> {
        self.mint(&Asset::Native, account, amount)
    }

    /// Let `spender` move up to `amount` of `owner`'s `token`. Replaces any
    /// previous allowance, including one consumed by an open transaction.
    pub fn approve(&self, token: &Address, owner: &Address, spender: &Address, amount: U256) -> Result<()> {
        if token.is_native() {
            return Err(ExchangeError::InvalidAddress(token.to_string()));
        }
        self.inner
            .lock()
            .state
            .allowances
            .insert((token.clone(), owner.clone(), spender.clone()), amount);
        debug!(token = %token, owner = %owner, spender = %spender, amount = %amount, "Approved");
        Ok(())
    }

    /// Current balance, without going through the async trait.
    pub fn balance(&self, asset: &Asset, account: &Address) -> U256 {
        self.inner.lock().state.balance(asset, account)
    }

    /// Every journal entry, oldest first.
    pub fn journal(&self) -> Vec<JournalEntry> {
        self.inner.lock().state.journal.clone()
    }

    /// Entries written under `tx`.
    pub fn batch(&self, tx: TransactionId) -> JournalBatch {
        let inner = self.inner.lock();
        let mut batch = JournalBatch::new();
        for entry in inner.state.journal.iter().filter(|e| e.transaction_id == Some(tx)) {
            batch.add_entry(entry.clone());
        }
        batch
    }

    /// Transactions committed so far, oldest first.
    pub fn committed_transactions(&self) -> Vec<TransactionId> {
        self.inner.lock().committed.clone()
    }

    /// Whether a unit of work is open.
    pub fn in_transaction(&self) -> bool {
        self.inner.lock().open.is_some()
    }

    fn token_asset(token: &Address) -> Result<Asset> {
        match Asset::from(token) {
            Asset::Native => Err(ExchangeError::InvalidAddress(format!(
                "{} is the native currency, not a token",
                token
            ))),
            asset => Ok(asset),
        }
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn balance_of(&self, asset: &Asset, account: &Address) -> Result<U256> {
        Ok(self.balance(asset, account))
    }

    async fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> Result<U256> {
        Ok(self.inner.lock().state.allowance(token, owner, spender))
    }

    #[instrument(skip(self))]
    async fn transfer_from(
        &self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: U256,
    ) -> Result<()> {
        let asset = Self::token_asset(token)?;
        let mut inner = self.inner.lock();
        let tx = inner.current_tx();

        let allowance = inner.state.allowance(token, from, spender);
        if allowance < amount {
            warn!(allowance = %allowance, "Allowance exceeded");
            return Err(ExchangeError::AllowanceExceeded);
        }

        inner.state.move_balance(&asset, from, to, amount, tx)?;
        inner.log(Undo::Move {
            asset,
            from: from.clone(),
            to: to.clone(),
            amount,
        });

        // An unlimited approval is never consumed.
        if allowance != U256::MAX {
            let key = (token.clone(), from.clone(), spender.clone());
            let after = allowance - amount;
            inner.state.allowances.insert(key.clone(), after);
            inner.log(Undo::Allowance {
                key,
                before: allowance,
                after,
            });
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn transfer(&self, token: &Address, from: &Address, to: &Address, amount: U256) -> Result<()> {
        let asset = Self::token_asset(token)?;
        let mut inner = self.inner.lock();
        let tx = inner.current_tx();
        inner.state.move_balance(&asset, from, to, amount, tx)?;
        inner.log(Undo::Move {
            asset,
            from: from.clone(),
            to: to.clone(),
            amount,
        });
        Ok(())
    }

    #[instrument(skip(self))]
    async fn transfer_native(&self, from: &Address, to: &Address, amount: U256) -> Result<()> {
        let mut inner = self.inner.lock();
        let tx = inner.current_tx();
        inner.state.move_balance(&Asset::Native, from, to, amount, tx)?;
        inner.log(Undo::Move {
            asset: Asset::Native,
            from: from.clone(),
            to: to.clone(),
            amount,
        });
        Ok(())
    }

    async fn begin(&self) -> Result<TransactionId> {
        let mut inner = self.inner.lock();
        if let Some(open) = &inner.open {
            return Err(ExchangeError::Transaction(format!(
                "transaction {} is already open",
                open.id
            )));
        }

        let id = TransactionId::new();
        inner.open = Some(OpenTransaction { id, undo: Vec::new() });
        debug!(tx = %id, "Transaction opened");
        Ok(id)
    }

    async fn commit(&self, tx: TransactionId) -> Result<()> {
        let mut inner = self.inner.lock();
        match inner.open.take() {
            Some(open) if open.id == tx => {
                inner.committed.push(tx);
                info!(tx = %tx, "Transaction committed");
                Ok(())
            }
            other => {
                inner.open = other;
                Err(ExchangeError::Transaction(format!("transaction {} is not open", tx)))
            }
        }
    }

    async fn rollback(&self, tx: TransactionId) -> Result<()> {
        let mut inner = self.inner.lock();
        match inner.open.take() {
            Some(open) if open.id == tx => {
                if let Err(e) = inner.unwind(&open) {
                    warn!(tx = %tx, error = %e, "Rollback failed, transaction left open");
                    inner.open = Some(open);
                    return Err(e);
                }
                info!(tx = %tx, changes = open.undo.len(), "Transaction rolled back");
                Ok(())
            }
            other => {
                inner.open = other;
                Err(ExchangeError::Transaction(format!("transaction {} is not open", tx)))
            }
        }
    }
}
