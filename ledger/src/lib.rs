//! TokenSwap Ledger
//!
//! The balance-and-transfer substrate the exchange settles against: the
//! [`Ledger`] capability the engine consumes, and an in-memory
//! implementation with transactional rollback and a double-entry journal.

pub mod ledger;
pub mod memory;
pub mod journal;

pub use ledger::Ledger;
pub use memory::InMemoryLedger;
pub use journal::{EntryType, JournalBatch, JournalEntry};
