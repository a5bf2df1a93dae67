//! Simulation controller.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, bail};
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use tokenswap_common::{parse_amount, Address, Asset, Result as ExchangeResult, U256};
use tokenswap_exchange::{ExchangeConfig, SwapEngine, SwapReceipt, SwapRequest};
use tokenswap_ledger::InMemoryLedger;

use crate::metrics::SimulationMetrics;
use crate::scenario::{Scenario, ScenarioStep, ADMIN, ENGINE, NATIVE};
use crate::trader::TraderFactory;

/// Tokens used by random traffic.
const RANDOM_TOKENS: [&str; 3] = ["usdt", "pkf", "dai"];

/// Liquidity the exchange starts with in each token for random traffic.
const RANDOM_LIQUIDITY: u64 = 50_000_000;

/// Drives a swap engine over an in-memory ledger.
pub struct SimulationController {
    /// Engine under test.
    engine: Arc<SwapEngine>,
    /// Ledger the engine settles against.
    ledger: Arc<InMemoryLedger>,
    /// Random number generator.
    rng: StdRng,
    /// Simulation metrics.
    metrics: SimulationMetrics,
}

impl SimulationController {
    /// Create a new simulation controller.
    pub fn new(config: ExchangeConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        let ledger = Arc::new(InMemoryLedger::new());
        let engine = Arc::new(SwapEngine::with_owner(config, ledger.clone()));

        Self {
            engine,
            ledger,
            rng,
            metrics: SimulationMetrics::new(),
        }
    }

    /// Run every step of a scenario, stopping at the first unmet expectation.
    pub async fn run_scenario(&mut self, scenario: &Scenario) -> anyhow::Result<()> {
        info!(
            scenario = %scenario.name,
            description = %scenario.description,
            steps = scenario.steps.len(),
            "Running scenario"
        );

        for (index, step) in scenario.steps.iter().enumerate() {
            self.execute_step(step)
                .await
                .map_err(|e| anyhow!("step {} ({:?}) failed: {}", index + 1, step, e))?;
        }

        info!(scenario = %scenario.name, "Scenario passed");
        Ok(())
    }

    /// Submit `swap_count` random swaps from `trader_count` traders at once.
    ///
    /// Fails if any token's total supply changes.
    pub async fn run_random(&mut self, trader_count: usize, swap_count: usize) -> anyhow::Result<()> {
        if trader_count == 0 {
            bail!("at least one trader is required");
        }

        let admin = self.engine.config().administrator.clone();
        let account = self.engine.engine_account().clone();
        let tokens: Vec<Address> = RANDOM_TOKENS.iter().map(|t| Address::new(*t)).collect();

        for from in &tokens {
            for to in tokens.iter().filter(|t| *t != from) {
                let from_amount = U256::from(self.rng.gen_range(1u64..=1_000));
                let to_amount = U256::from(self.rng.gen_range(1u64..=1_000));
                self.engine
                    .set_rate(&admin, from.clone(), to.clone(), from_amount, to_amount)
                    .await?;
            }
            self.ledger
                .mint_token(from, &account, U256::from(RANDOM_LIQUIDITY))?;
        }

        let traders = TraderFactory::create_traders(trader_count);
        for trader in &traders {
            trader.fund(&self.ledger, &tokens, &account, &mut self.rng)?;
        }

        let holders: Vec<Address> = traders
            .iter()
            .map(|t| t.address.clone())
            .chain(std::iter::once(account.clone()))
            .collect();
        let supply_before = self.supply(&tokens, &holders);

        let mut requests = Vec::with_capacity(swap_count);
        for _ in 0..swap_count {
            let trader = &traders[self.rng.gen_range(0..traders.len())];
            let from = self.rng.gen_range(0..tokens.len());
            let to = (from + self.rng.gen_range(1..tokens.len())) % tokens.len();
            let amount = U256::from(self.rng.gen_range(1u64..=50_000));
            requests.push(SwapRequest::new(
                trader.address.clone(),
                tokens[from].clone(),
                tokens[to].clone(),
                amount,
            ));
        }

        info!(traders = trader_count, swaps = swap_count, "Submitting random swaps");

        let engine = self.engine.clone();
        let submissions = requests.into_iter().map(move |request| {
            let engine = engine.clone();
            async move {
                let started = Instant::now();
                let result = engine.swap(request).await;
                (result, started.elapsed().as_micros() as u64)
            }
        });

        for (result, latency_us) in join_all(submissions).await {
            self.record(&result, latency_us);
        }

        let supply_after = self.supply(&tokens, &holders);
        if supply_before != supply_after {
            bail!(
                "token supply changed: {:?} -> {:?}",
                supply_before,
                supply_after
            );
        }

        Ok(())
    }

    /// Get simulation metrics.
    pub fn metrics(&self) -> &SimulationMetrics {
        &self.metrics
    }

    /// Get the engine.
    pub fn engine(&self) -> &Arc<SwapEngine> {
        &self.engine
    }

    // --- Private methods ---

    async fn execute_step(&mut self, step: &ScenarioStep) -> anyhow::Result<()> {
        match step {
            ScenarioStep::SetRate {
                caller,
                from,
                to,
                from_amount,
                to_amount,
                expect,
            } => {
                let result = self
                    .engine
                    .set_rate(
                        &self.account(caller),
                        token(from),
                        token(to),
                        parse_amount(from_amount)?,
                        parse_amount(to_amount)?,
                    )
                    .await;
                check_outcome(result.map(|_| ()), expect.as_deref())?;
            }
            ScenarioStep::Mint {
                token: name,
                account,
                amount,
            } => {
                let account = self.account(account);
                self.ledger
                    .mint(&Asset::from(token(name)), &account, parse_amount(amount)?)?;
            }
            ScenarioStep::MintNative { account, amount } => {
                let account = self.account(account);
                self.ledger.mint_native(&account, parse_amount(amount)?)?;
            }
            ScenarioStep::Approve {
                token: name,
                owner,
                amount,
            } => {
                let owner = self.account(owner);
                let spender = self.engine.engine_account().clone();
                self.ledger
                    .approve(&token(name), &owner, &spender, parse_amount(amount)?)?;
            }
            ScenarioStep::Swap {
                caller,
                from,
                to,
                amount,
                attached_native,
                expect,
                expect_output,
            } => {
                let amount = parse_amount(amount.as_deref().unwrap_or("0"))?;
                let attached = parse_amount(attached_native.as_deref().unwrap_or("0"))?;
                let request = SwapRequest::new(self.account(caller), token(from), token(to), amount)
                    .with_attached_native(attached);

                let started = Instant::now();
                let result = self.engine.swap(request).await;
                self.record(&result, started.elapsed().as_micros() as u64);

                if let (Ok(receipt), Some(output)) = (&result, expect_output) {
                    let expected = parse_amount(output)?;
                    if receipt.amount_out != expected {
                        bail!("expected output {}, got {}", expected, receipt.amount_out);
                    }
                }
                check_outcome(result.map(|_| ()), expect.as_deref())?;
            }
            ScenarioStep::AssertBalance {
                token: name,
                account,
                amount,
            } => {
                let account = self.account(account);
                let actual = self.ledger.balance(&Asset::from(token(name)), &account);
                let expected = parse_amount(amount)?;
                if actual != expected {
                    bail!("{} holds {} of {}, expected {}", account, actual, name, expected);
                }
                debug!(account = %account, token = %name, balance = %actual, "Balance as expected");
            }
        }

        Ok(())
    }

    fn record(&mut self, result: &ExchangeResult<SwapReceipt>, latency_us: u64) {
        if let Err(e) = result {
            debug!(code = e.error_code(), latency_us, "Swap rejected");
        }
        self.metrics.record(result, latency_us);
    }

    fn account(&self, name: &str) -> Address {
        match name {
            ENGINE => self.engine.engine_account().clone(),
            ADMIN => self.engine.owner().unwrap_or_else(|| self.engine.config().administrator.clone()),
            other => Address::new(other),
        }
    }

    /// Total held of each token across `holders`.
    fn supply(&self, tokens: &[Address], holders: &[Address]) -> Vec<U256> {
        tokens
            .iter()
            .map(|t| {
                let asset = Asset::from(t);
                holders
                    .iter()
                    .fold(U256::zero(), |acc, h| acc + self.ledger.balance(&asset, h))
            })
            .collect()
    }
}

fn token(name: &str) -> Address {
    if name == NATIVE {
        Address::native()
    } else {
        Address::new(name)
    }
}

/// Compare an outcome against an expected error code.
fn check_outcome(result: ExchangeResult<()>, expect: Option<&str>) -> anyhow::Result<()> {
    match (result, expect) {
        (Ok(()), None) => Ok(()),
        (Ok(()), Some(code)) => bail!("expected {}, but the operation succeeded", code),
        (Err(e), Some(code)) if e.error_code() == code => Ok(()),
        (Err(e), _) => Err(anyhow!("unexpected {}: {}", e.error_code(), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_builtin_scenarios_pass() {
        for name in Scenario::builtin_names() {
            let mut controller = SimulationController::new(ExchangeConfig::default(), Some(1));
            let scenario = Scenario::load(name).unwrap();
            controller.run_scenario(&scenario).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_failure_modes_recorded() {
        let mut controller = SimulationController::new(ExchangeConfig::default(), Some(1));
        controller
            .run_scenario(&Scenario::load("failure-modes").unwrap())
            .await
            .unwrap();

        let metrics = controller.metrics();
        assert_eq!(metrics.settled_swaps, 1);
        assert_eq!(metrics.rejections.get("INVALID_AMOUNT"), Some(&2));
        assert_eq!(metrics.rejections.get("ALLOWANCE_EXCEEDED"), Some(&1));
    }

    #[tokio::test]
    async fn test_unmet_expectation_fails() {
        let mut controller = SimulationController::new(ExchangeConfig::default(), Some(1));
        let scenario = Scenario {
            name: "wrong".to_string(),
            description: String::new(),
            steps: vec![ScenarioStep::AssertBalance {
                token: "usdt".to_string(),
                account: "alice".to_string(),
                amount: "1".to_string(),
            }],
        };
        assert!(controller.run_scenario(&scenario).await.is_err());
    }

    #[tokio::test]
    async fn test_random_traffic_conserves_supply() {
        let mut controller = SimulationController::new(ExchangeConfig::default(), Some(42));
        controller.run_random(4, 50).await.unwrap();

        let metrics = controller.metrics();
        assert_eq!(metrics.total_swaps, 50);
        assert_eq!(
            controller.engine().metrics().snapshot().swaps_attempted,
            50
        );
    }
}
