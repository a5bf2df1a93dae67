//! Administrator capability checks.

use std::collections::BTreeSet;

use parking_lot::RwLock;
use tokenswap_common::{Address, ExchangeError, Result};
use tracing::info;

/// Decides who may change rates.
///
/// The registry and the settlement engine only ever ask this question; swapping
/// the implementation changes the admin model without touching either.
pub trait Authorizer: Send + Sync {
    /// Whether `caller` may perform administrative operations.
    fn is_administrator(&self, caller: &Address) -> bool;

    /// Reject `caller` unless it is an administrator.
    fn ensure_administrator(&self, caller: &Address) -> Result<()> {
        if self.is_administrator(caller) {
            Ok(())
        } else {
            Err(ExchangeError::Unauthorized(caller.clone()))
        }
    }
}

/// Single-owner model: exactly one account administers the exchange.
pub struct OwnerAuthorizer {
    owner: RwLock<Address>,
}

impl OwnerAuthorizer {
    /// Create with an initial owner.
    pub fn new(owner: Address) -> Self {
        Self {
            owner: RwLock::new(owner),
        }
    }

    /// Current owner.
    pub fn owner(&self) -> Address {
        self.owner.read().clone()
    }

    /// Hand ownership to `new_owner`. Only the current owner may do this.
    pub fn transfer_ownership(&self, caller: &Address, new_owner: Address) -> Result<Address> {
        let mut owner = self.owner.write();
        if *owner != *caller {
            return Err(ExchangeError::Unauthorized(caller.clone()));
        }
        if new_owner.is_native() || !new_owner.is_valid() {
            return Err(ExchangeError::InvalidAddress(new_owner.to_string()));
        }

        let previous = std::mem::replace(&mut *owner, new_owner.clone());
        info!(previous = %previous, new_owner = %new_owner, "Ownership transferred");
        Ok(previous)
    }
}

impl Authorizer for OwnerAuthorizer {
    fn is_administrator(&self, caller: &Address) -> bool {
        *self.owner.read() == *caller
    }
}

/// Role-list model: any member of the set is an administrator.
#[derive(Default)]
pub struct AdminSet {
    admins: RwLock<BTreeSet<Address>>,
}

impl AdminSet {
    /// Create from an initial list of administrators.
    pub fn new(admins: impl IntoIterator<Item = Address>) -> Self {
        Self {
            admins: RwLock::new(admins.into_iter().collect()),
        }
    }

    /// Add `account`; `caller` must already be an administrator.
    pub fn grant(&self, caller: &Address, account: Address) -> Result<bool> {
        self.ensure_administrator(caller)?;
        let added = self.admins.write().insert(account.clone());
        if added {
            info!(granted_by = %caller, account = %account, "Administrator granted");
        }
        Ok(added)
    }

    /// Remove `account`; `caller` must be an administrator. The last
    /// administrator cannot be removed.
    pub fn revoke(&self, caller: &Address, account: &Address) -> Result<bool> {
        self.ensure_administrator(caller)?;
        let mut admins = self.admins.write();
        if admins.len() == 1 && admins.contains(account) {
            return Err(ExchangeError::Configuration(
                "cannot revoke the last administrator".to_string(),
            ));
        }
        let removed = admins.remove(account);
        if removed {
            info!(revoked_by = %caller, account = %account, "Administrator revoked");
        }
        Ok(removed)
    }

    /// Current administrators, sorted.
    pub fn members(&self) -> Vec<Address> {
        self.admins.read().iter().cloned().collect()
    }
}

impl Authorizer for AdminSet {
    fn is_administrator(&self, caller: &Address) -> bool {
        self.admins.read().contains(caller)
    }
}
