//! Simulated traders for random traffic.

use rand::Rng;
use tokenswap_common::{Address, U256};
use tracing::debug;
use tokenswap_ledger::InMemoryLedger;

/// A simulated account that holds tokens and submits swaps.
#[derive(Debug, Clone)]
pub struct Trader {
    /// Ledger account.
    pub address: Address,
    /// Display name.
    pub name: String,
}

impl Trader {
    /// Create a new trader.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            address: Address::new(format!("trader-{}", name)),
            name,
        }
    }

    /// Give the trader a random balance of each token and approve the
    /// exchange for all of it.
    pub fn fund<R: Rng>(
        &self,
        ledger: &InMemoryLedger,
        tokens: &[Address],
        spender: &Address,
        rng: &mut R,
    ) -> anyhow::Result<()> {
        for token in tokens {
            let amount = U256::from(rng.gen_range(1_000u64..1_000_000));
            ledger.mint_token(token, &self.address, amount)?;
            ledger.approve(token, &self.address, spender, U256::MAX)?;
            debug!(trader = %self.name, token = %token, amount = %amount, "Trader funded");
        }
        Ok(())
    }
}

/// Factory for creating traders.
pub struct TraderFactory;

impl TraderFactory {
    /// Create `count` traders with distinct names.
    pub fn create_traders(count: usize) -> Vec<Trader> {
        (0..count).map(|i| Trader::new(format!("{:03}", i))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tokenswap_common::Asset;

    #[test]
    fn test_create_traders() {
        let traders = TraderFactory::create_traders(3);
        assert_eq!(traders.len(), 3);
        assert_eq!(traders[1].address, Address::new("trader-001"));
        assert_eq!(traders[1].name, "001");
    }

    #[test]
    fn test_fund() {
        let ledger = InMemoryLedger::new();
        let trader = Trader::new("a");
        let token = Address::new("usdt");
        let mut rng = StdRng::seed_from_u64(7);

        trader
            .fund(&ledger, &[token.clone()], &Address::new("engine"), &mut rng)
            .unwrap();
        assert!(!ledger.balance(&Asset::from(&token), &trader.address).is_zero());
    }
}
