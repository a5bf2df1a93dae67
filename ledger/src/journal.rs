//! Journal entry types for double-entry bookkeeping.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokenswap_common::{serde_u256, Address, Asset, TransactionId, U256};
use uuid::Uuid;

/// Type of journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryType {
    /// Value leaving an account.
    Debit,
    /// Value arriving in an account.
    Credit,
}

/// A single journal entry in the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique entry ID.
    pub id: Uuid,
    /// Transaction this entry belongs to, if any.
    pub transaction_id: Option<TransactionId>,
    /// Account affected.
    pub account: Address,
    /// Asset moved.
    pub asset: Asset,
    /// Entry type (debit or credit).
    pub entry_type: EntryType,
    /// Amount in base units.
    #[serde(with = "serde_u256")]
    pub amount: U256,
    /// Balance after this entry.
    #[serde(with = "serde_u256")]
    pub balance_after: U256,
    /// When this entry was created.
    pub created_at: DateTime<Utc>,
}

impl JournalEntry {
    /// Create a debit entry.
    pub fn debit(
        transaction_id: Option<TransactionId>,
        account: Address,
        asset: Asset,
        amount: U256,
        balance_after: U256,
    ) -> Self {
        Self::new(transaction_id, account, asset, EntryType::Debit, amount, balance_after)
    }

    /// Create a credit entry.
    pub fn credit(
        transaction_id: Option<TransactionId>,
        account: Address,
        asset: Asset,
        amount: U256,
        balance_after: U256,
    ) -> Self {
        Self::new(transaction_id, account, asset, EntryType::Credit, amount, balance_after)
    }

    fn new(
        transaction_id: Option<TransactionId>,
        account: Address,
        asset: Asset,
        entry_type: EntryType,
        amount: U256,
        balance_after: U256,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            transaction_id,
            account,
            asset,
            entry_type,
            amount,
            balance_after,
            created_at: Utc::now(),
        }
    }
}

/// A batch of journal entries that were committed together.
#[derive(Debug, Clone, Default)]
pub struct JournalBatch {
    /// Entries in the batch.
    pub entries: Vec<JournalEntry>,
}

impl JournalBatch {
    /// Create a new batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry to the batch.
    pub fn add_entry(&mut self, entry: JournalEntry) {
        self.entries.push(entry);
    }

    /// Verify the batch is balanced (debits == credits per asset).
    pub fn is_balanced(&self) -> bool {
        let mut totals: HashMap<&Asset, (U256, U256)> = HashMap::new();

        for entry in &self.entries {
            let (debits, credits) = totals
                .entry(&entry.asset)
                .or_insert((U256::zero(), U256::zero()));
            let slot = match entry.entry_type {
                EntryType::Debit => debits,
                EntryType::Credit => credits,
            };
            match slot.checked_add(entry.amount) {
                Some(sum) => *slot = sum,
                None => return false,
            }
        }

        totals.values().all(|(debits, credits)| debits == credits)
    }

    /// Total debited in `asset`.
    pub fn total_debits(&self, asset: &Asset) -> U256 {
        self.sum(asset, EntryType::Debit)
    }

    /// Total credited in `asset`.
    pub fn total_credits(&self, asset: &Asset) -> U256 {
        self.sum(asset, EntryType::Credit)
    }

    fn sum(&self, asset: &Asset, entry_type: EntryType) -> U256 {
        self.entries
            .iter()
            .filter(|e| e.entry_type == entry_type && e.asset == *asset)
            .fold(U256::zero(), |acc, e| acc.saturating_add(e.amount))
    }
}
