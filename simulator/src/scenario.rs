//! Simulation scenarios.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Account name that resolves to the exchange's own account.
pub const ENGINE: &str = "$engine";

/// Account name that resolves to the configured administrator.
pub const ADMIN: &str = "$admin";

/// Token name that resolves to the native currency sentinel.
pub const NATIVE: &str = "$native";

/// A simulation scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Steps in the scenario.
    pub steps: Vec<ScenarioStep>,
}

/// A step in a scenario. Amounts are decimal strings in base units and may
/// contain `_` separators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScenarioStep {
    /// Write a rate.
    SetRate {
        #[serde(default = "admin")]
        caller: String,
        from: String,
        to: String,
        from_amount: String,
        to_amount: String,
        /// Expected error code; `None` means the write must succeed.
        #[serde(default)]
        expect: Option<String>,
    },
    /// Credit ledger tokens.
    Mint {
        token: String,
        account: String,
        amount: String,
    },
    /// Credit native currency.
    MintNative { account: String, amount: String },
    /// Let the exchange spend `owner`'s tokens.
    Approve {
        token: String,
        owner: String,
        amount: String,
    },
    /// Submit a swap.
    Swap {
        caller: String,
        from: String,
        to: String,
        #[serde(default)]
        amount: Option<String>,
        #[serde(default)]
        attached_native: Option<String>,
        /// Expected error code; `None` means the swap must settle.
        #[serde(default)]
        expect: Option<String>,
        /// Expected output when the swap settles.
        #[serde(default)]
        expect_output: Option<String>,
    },
    /// Check a balance.
    AssertBalance {
        token: String,
        account: String,
        amount: String,
    },
}

fn admin() -> String {
    ADMIN.to_string()
}

impl Scenario {
    /// Load a built-in scenario by name.
    pub fn load(name: &str) -> anyhow::Result<Self> {
        match name {
            "basic-swap" => Ok(Self::basic_swap()),
            "native-swap" => Ok(Self::native_swap()),
            "failure-modes" => Ok(Self::failure_modes()),
            _ => Err(anyhow::anyhow!("Unknown scenario: {}", name)),
        }
    }

    /// Load a scenario from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Names accepted by [`Scenario::load`].
    pub fn builtin_names() -> &'static [&'static str] {
        &["basic-swap", "native-swap", "failure-modes"]
    }

    /// Token-for-token swaps with and without truncation.
    fn basic_swap() -> Self {
        Self {
            name: "basic-swap".to_string(),
            description: "USDT to PKF at a fractional rate, then a truncating rate".to_string(),
            steps: vec![
                set_rate("usdt", "pkf", "1_000_000", "571_590"),
                mint("pkf", ENGINE, "1_000_000"),
                mint("usdt", "alice", "100_000"),
                approve("usdt", "alice", "100_000"),
                swap("alice", "usdt", "pkf", "100_000", None, Some("57_159")),
                assert_balance("pkf", "alice", "57_159"),
                assert_balance("usdt", ENGINE, "100_000"),
                set_rate("usdt", "pkf", "3", "1"),
                mint("usdt", "bob", "1_000_000"),
                approve("usdt", "bob", "1_000_000"),
                swap("bob", "usdt", "pkf", "1_000_000", None, Some("333_333")),
                assert_balance("pkf", ENGINE, "609_508"),
            ],
        }
    }

    /// Native currency in both directions.
    fn native_swap() -> Self {
        Self {
            name: "native-swap".to_string(),
            description: "Native currency for PKF and back".to_string(),
            steps: vec![
                set_rate(NATIVE, "pkf", "1", "100"),
                set_rate("pkf", NATIVE, "100", "1"),
                mint("pkf", ENGINE, "10_000"),
                ScenarioStep::MintNative {
                    account: "alice".to_string(),
                    amount: "10".to_string(),
                },
                ScenarioStep::Swap {
                    caller: "alice".to_string(),
                    from: NATIVE.to_string(),
                    to: "pkf".to_string(),
                    amount: None,
                    attached_native: Some("5".to_string()),
                    expect: None,
                    expect_output: Some("500".to_string()),
                },
                assert_balance(NATIVE, ENGINE, "5"),
                approve("pkf", "alice", "300"),
                swap("alice", "pkf", NATIVE, "300", None, Some("3")),
                assert_balance(NATIVE, "alice", "8"),
                assert_balance(NATIVE, ENGINE, "2"),
                mint("pkf", "alice", "1_000"),
                swap("alice", "pkf", NATIVE, "500", Some("INSUFFICIENT_LIQUIDITY"), None),
                assert_balance("pkf", "alice", "1_200"),
            ],
        }
    }

    /// Every rejection path, in check order.
    fn failure_modes() -> Self {
        Self {
            name: "failure-modes".to_string(),
            description: "Rejections surface in order and change no balance".to_string(),
            steps: vec![
                swap("alice", "x", "y", "10", Some("NO_ROUTE"), None),
                ScenarioStep::SetRate {
                    caller: "mallory".to_string(),
                    from: "usdt".to_string(),
                    to: "pkf".to_string(),
                    from_amount: "1".to_string(),
                    to_amount: "1".to_string(),
                    expect: Some("UNAUTHORIZED".to_string()),
                },
                set_rate("usdt", "pkf", "3", "1"),
                swap("alice", "usdt", "pkf", "0", Some("INVALID_AMOUNT"), None),
                swap("alice", "usdt", "pkf", "2", Some("INVALID_AMOUNT"), None),
                swap("alice", "usdt", "pkf", "30", Some("INSUFFICIENT_CALLER_FUNDS"), None),
                mint("usdt", "bob", "3_000"),
                approve("usdt", "bob", "3_000"),
                swap("bob", "usdt", "pkf", "3_000", Some("INSUFFICIENT_LIQUIDITY"), None),
                assert_balance("usdt", "bob", "3_000"),
                mint("pkf", ENGINE, "1_000"),
                mint("usdt", "carol", "30"),
                swap("carol", "usdt", "pkf", "30", Some("ALLOWANCE_EXCEEDED"), None),
                assert_balance("usdt", "carol", "30"),
                assert_balance("pkf", ENGINE, "1_000"),
                swap("bob", "usdt", "pkf", "3_000", None, Some("1_000")),
            ],
        }
    }
}

fn set_rate(from: &str, to: &str, from_amount: &str, to_amount: &str) -> ScenarioStep {
    ScenarioStep::SetRate {
        caller: admin(),
        from: from.to_string(),
        to: to.to_string(),
        from_amount: from_amount.to_string(),
        to_amount: to_amount.to_string(),
        expect: None,
    }
}

fn mint(token: &str, account: &str, amount: &str) -> ScenarioStep {
    ScenarioStep::Mint {
        token: token.to_string(),
        account: account.to_string(),
        amount: amount.to_string(),
    }
}

fn approve(token: &str, owner: &str, amount: &str) -> ScenarioStep {
    ScenarioStep::Approve {
        token: token.to_string(),
        owner: owner.to_string(),
        amount: amount.to_string(),
    }
}

fn swap(
    caller: &str,
    from: &str,
    to: &str,
    amount: &str,
    expect: Option<&str>,
    expect_output: Option<&str>,
) -> ScenarioStep {
    ScenarioStep::Swap {
        caller: caller.to_string(),
        from: from.to_string(),
        to: to.to_string(),
        amount: Some(amount.to_string()),
        attached_native: None,
        expect: expect.map(str::to_string),
        expect_output: expect_output.map(str::to_string),
    }
}

fn assert_balance(token: &str, account: &str, amount: &str) -> ScenarioStep {
    ScenarioStep::AssertBalance {
        token: token.to_string(),
        account: account.to_string(),
        amount: amount.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_load() {
        for name in Scenario::builtin_names() {
            let scenario = Scenario::load(name).unwrap();
            assert_eq!(scenario.name, *name);
            assert!(!scenario.steps.is_empty());
        }
        assert!(Scenario::load("nope").is_err());
    }

    #[test]
    fn test_step_json_shape() {
        let step: ScenarioStep = serde_json::from_str(
            r#"{"step":"swap","caller":"alice","from":"usdt","to":"pkf","amount":"10","expect":"NO_ROUTE"}"#,
        )
        .unwrap();
        match step {
            ScenarioStep::Swap { expect, attached_native, .. } => {
                assert_eq!(expect.as_deref(), Some("NO_ROUTE"));
                assert!(attached_native.is_none());
            }
            other => panic!("unexpected step {:?}", other),
        }

        let step: ScenarioStep = serde_json::from_str(
            r#"{"step":"set_rate","from":"usdt","to":"pkf","from_amount":"1","to_amount":"2"}"#,
        )
        .unwrap();
        assert!(matches!(step, ScenarioStep::SetRate { ref caller, .. } if caller == ADMIN));
    }
}
