//! Identifier types for exchange entities.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Hex form of the reserved native-currency sentinel.
pub const NATIVE_SENTINEL: &str = "0x0000000000000000000000000000000000000000";

/// Opaque address of an account or a token contract.
///
/// Addresses compare case-insensitively; they are stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Create a new address.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into().trim().to_lowercase())
    }

    /// The sentinel that stands for the chain's native currency.
    pub fn native() -> Self {
        Self(NATIVE_SENTINEL.to_string())
    }

    /// Whether this is the native-currency sentinel.
    pub fn is_native(&self) -> bool {
        self.0 == NATIVE_SENTINEL
    }

    /// Get the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check for the canonical `0x` + 40 hex digit form.
    pub fn is_hex(&self) -> bool {
        self.0.len() == 42
            && self.0.starts_with("0x")
            && self.0[2..].chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Basic validation: non-empty, no whitespace, bounded length.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty() && self.0.len() <= 128 && !self.0.chars().any(char::is_whitespace)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

/// What a balance is denominated in: the native currency or a ledger token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Asset {
    /// The chain's native currency, moved by value attachment.
    Native,
    /// A ledger-tracked token identified by its contract address.
    Token(Address),
}

impl Asset {
    /// Whether this is the native currency.
    pub fn is_native(&self) -> bool {
        matches!(self, Asset::Native)
    }

    /// Token address, or the sentinel for the native currency.
    pub fn address(&self) -> Address {
        match self {
            Asset::Native => Address::native(),
            Asset::Token(address) => address.clone(),
        }
    }
}

impl From<Address> for Asset {
    fn from(address: Address) -> Self {
        if address.is_native() {
            Asset::Native
        } else {
            Asset::Token(address)
        }
    }
}

impl From<&Address> for Asset {
    fn from(address: &Address) -> Self {
        Asset::from(address.clone())
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native => write!(f, "native"),
            Asset::Token(address) => write!(f, "{}", address),
        }
    }
}

/// Unique identifier for an executed swap.
/// Uses UUID v7 so receipts sort by execution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SwapId(Uuid);

impl SwapId {
    /// Create a new swap ID.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parse from string.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SwapId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SwapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an open ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Create a new transaction ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_normalization() {
        let a = Address::new("0xABCdef0000000000000000000000000000000001");
        let b = Address::new("0xabcdef0000000000000000000000000000000001");
        assert_eq!(a, b);
        assert!(a.is_hex());
        assert!(a.is_valid());
    }

    #[test]
    fn test_address_validation() {
        assert!(Address::new("usdt").is_valid());
        assert!(!Address::new("usdt").is_hex());
        assert!(!Address::new("").is_valid());
        assert!(!Address::new("two words").is_valid());
    }

    #[test]
    fn test_native_sentinel_maps_to_native_asset() {
        assert!(Address::native().is_native());
        assert_eq!(Asset::from(Address::native()), Asset::Native);
        assert_eq!(
            Asset::from(Address::new("0xusdt")),
            Asset::Token(Address::new("0xusdt"))
        );
        assert_eq!(Asset::Native.address(), Address::native());
    }

    #[test]
    fn test_swap_id_creation() {
        let id1 = SwapId::new();
        let id2 = SwapId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_swap_id_parse() {
        let uuid_str = "019456ab-1234-7def-8901-234567890abc";
        let id = SwapId::parse(uuid_str).unwrap();
        assert_eq!(id.to_string(), uuid_str);
    }

    #[test]
    fn test_address_serde_is_plain_string() {
        let json = serde_json::to_string(&Address::new("0xPKF")).unwrap();
        assert_eq!(json, "\"0xpkf\"");
        let back: Address = serde_json::from_str("\"0xPKF\"").unwrap();
        assert_eq!(back, Address::new("0xpkf"));
    }
}
