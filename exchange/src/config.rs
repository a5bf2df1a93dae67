//! Exchange configuration.

use tokenswap_common::{Address, ExchangeError, Result};
use tokenswap_rates::RoundingMode;

/// Default capacity of the exchange event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Main exchange configuration.
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    /// Account that acts as counterparty for every swap and holds liquidity.
    pub engine_account: Address,
    /// Initial owner when ownership is managed by the engine.
    pub administrator: Address,
    /// Treatment of conversion remainders.
    pub rounding: RoundingMode,
    /// Buffer size of the event broadcast channel.
    pub event_capacity: usize,
    /// Log level.
    pub log_level: String,
    /// Emit logs as JSON.
    pub log_json: bool,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            engine_account: Address::new("tokenswap-engine"),
            administrator: Address::new("tokenswap-admin"),
            rounding: RoundingMode::Floor,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl ExchangeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup; unset keys keep their defaults.
    pub fn from_source<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(account) = lookup("EXCHANGE_ENGINE_ACCOUNT") {
            config.engine_account = Address::new(account);
        }

        if let Some(admin) = lookup("EXCHANGE_ADMIN") {
            config.administrator = Address::new(admin);
        }

        if let Some(rounding) = lookup("EXCHANGE_ROUNDING") {
            config.rounding = rounding.parse()?;
        }

        if let Some(capacity) = lookup("EXCHANGE_EVENT_CAPACITY") {
            config.event_capacity = capacity.trim().parse().map_err(|_| {
                ExchangeError::Configuration(format!("invalid event capacity '{}'", capacity))
            })?;
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = level;
        }

        if let Some(format) = lookup("LOG_FORMAT") {
            config.log_json = format.eq_ignore_ascii_case("json");
        }

        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.engine_account.is_valid() {
            return Err("Engine account must be a non-empty address".to_string());
        }

        if self.engine_account.is_native() {
            return Err("Engine account cannot be the native currency sentinel".to_string());
        }

        if !self.administrator.is_valid() || self.administrator.is_native() {
            return Err("Administrator must be a valid account address".to_string());
        }

        if self.event_capacity == 0 {
            return Err("Event capacity cannot be 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ExchangeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rounding, RoundingMode::Floor);
    }

    #[test]
    fn test_invalid_config() {
        let mut config = ExchangeConfig::default();
        config.event_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = ExchangeConfig::default();
        config.engine_account = Address::native();
        assert!(config.validate().is_err());

        let mut config = ExchangeConfig::default();
        config.engine_account = Address::new("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_source() {
        let config = ExchangeConfig::from_source(source(&[
            ("EXCHANGE_ENGINE_ACCOUNT", "0xEngine"),
            ("EXCHANGE_ADMIN", "0xOwner"),
            ("EXCHANGE_ROUNDING", "exact"),
            ("LOG_FORMAT", "JSON"),
        ]))
        .unwrap();

        assert_eq!(config.engine_account, Address::new("0xengine"));
        assert_eq!(config.administrator, Address::new("0xowner"));
        assert_eq!(config.rounding, RoundingMode::Exact);
        assert!(config.log_json);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_from_source_rejects_bad_values() {
        let result = ExchangeConfig::from_source(source(&[("EXCHANGE_ROUNDING", "ceil")]));
        assert!(matches!(result, Err(ExchangeError::Configuration(_))));

        let result = ExchangeConfig::from_source(source(&[("EXCHANGE_EVENT_CAPACITY", "many")]));
        assert!(matches!(result, Err(ExchangeError::Configuration(_))));
    }
}
