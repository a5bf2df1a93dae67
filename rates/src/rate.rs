//! Rate pair and trading pair types.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokenswap_common::{serde_u256, to_decimal, Address, ExchangeError, Result, U256};

/// An ordered (from, to) token pair. Rates are directional, so
/// `A -> B` and `B -> A` are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TradingPair {
    /// Token given by the caller.
    pub from: Address,
    /// Token received by the caller.
    pub to: Address,
}

impl TradingPair {
    /// Create a new trading pair.
    pub fn new(from: Address, to: Address) -> Self {
        Self { from, to }
    }

    /// The opposite direction.
    pub fn reverse(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

/// A registered conversion ratio: `from_amount` base units of the source
/// token are worth `to_amount` base units of the destination token.
///
/// Both components are nonzero; the only way to build one is [`RatePair::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRatePair", into = "RawRatePair")]
pub struct RatePair {
    from_amount: U256,
    to_amount: U256,
}

impl RatePair {
    /// Create a rate pair, rejecting zero components.
    pub fn new(from_amount: U256, to_amount: U256) -> Result<Self> {
        if from_amount.is_zero() || to_amount.is_zero() {
            return Err(ExchangeError::InvalidRate);
        }
        Ok(Self {
            from_amount,
            to_amount,
        })
    }

    /// Create from small integers.
    pub fn from_u64(from_amount: u64, to_amount: u64) -> Result<Self> {
        Self::new(U256::from(from_amount), U256::from(to_amount))
    }

    /// Source-side component.
    pub fn from_amount(&self) -> U256 {
        self.from_amount
    }

    /// Destination-side component.
    pub fn to_amount(&self) -> U256 {
        self.to_amount
    }

    /// The pair as a plain tuple.
    pub fn as_tuple(&self) -> (U256, U256) {
        (self.from_amount, self.to_amount)
    }

    /// Output base units per input base unit, for display only.
    ///
    /// `None` when either component is too wide for `Decimal`.
    pub fn price(&self) -> Option<Decimal> {
        let from = to_decimal(self.from_amount, 0)?;
        let to = to_decimal(self.to_amount, 0)?;
        to.checked_div(from).map(|p| p.normalize())
    }
}

impl fmt::Display for RatePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.from_amount, self.to_amount)
    }
}

/// Wire form of [`RatePair`], validated on the way in.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawRatePair {
    #[serde(with = "serde_u256")]
    from_amount: U256,
    #[serde(with = "serde_u256")]
    to_amount: U256,
}

impl TryFrom<RawRatePair> for RatePair {
    type Error = ExchangeError;

    fn try_from(raw: RawRatePair) -> Result<Self> {
        RatePair::new(raw.from_amount, raw.to_amount)
    }
}

impl From<RatePair> for RawRatePair {
    fn from(rate: RatePair) -> Self {
        Self {
            from_amount: rate.from_amount,
            to_amount: rate.to_amount,
        }
    }
}
