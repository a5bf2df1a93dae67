//! Fixed-width integer amounts.
//!
//! Token balances are 256-bit unsigned integers in the token's base units.
//! Products of two amounts are formed in 512 bits so they never overflow.

use rust_decimal::Decimal;
use uint::construct_uint;

use crate::error::ExchangeError;

construct_uint! {
    /// Unsigned 256-bit integer used for every balance and rate component.
    pub struct U256(4);
}

construct_uint! {
    /// Unsigned 512-bit integer for intermediate products.
    pub struct U512(8);
}

/// Widen a 256-bit value to 512 bits.
pub fn widen(value: U256) -> U512 {
    let U256(limbs) = value;
    U512([limbs[0], limbs[1], limbs[2], limbs[3], 0, 0, 0, 0])
}

/// Narrow a 512-bit value back to 256 bits, or `None` if it does not fit.
pub fn narrow(value: U512) -> Option<U256> {
    let U512(limbs) = value;
    if limbs[4..].iter().any(|&limb| limb != 0) {
        return None;
    }
    Some(U256([limbs[0], limbs[1], limbs[2], limbs[3]]))
}

/// Parse a base-unit amount written in decimal. Underscore separators are allowed.
pub fn parse_amount(value: &str) -> crate::error::Result<U256> {
    let digits: String = value.trim().chars().filter(|c| *c != '_').collect();
    if digits.is_empty() {
        return Err(ExchangeError::InvalidAmountFormat(value.to_string()));
    }
    U256::from_dec_str(&digits).map_err(|_| ExchangeError::InvalidAmountFormat(value.to_string()))
}

/// Express a base-unit amount in whole units, given the token's fractional digits.
///
/// Returns `None` when the amount exceeds the 96-bit mantissa of `Decimal`.
pub fn to_decimal(amount: U256, decimals: u32) -> Option<Decimal> {
    if amount.bits() > 96 {
        return None;
    }
    Decimal::try_from_i128_with_scale(amount.low_u128() as i128, decimals)
        .ok()
        .map(|d| d.normalize())
}

/// Serde adapter that writes `U256` values as decimal strings.
pub mod serde_u256 {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{parse_amount, U256};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_amount(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_widen_narrow() {
        let value = U256::MAX;
        assert_eq!(narrow(widen(value)), Some(value));

        let too_big = widen(U256::MAX) * U512::from(2u64);
        assert_eq!(narrow(too_big), None);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1_000_000").unwrap(), U256::from(1_000_000u64));
        assert_eq!(parse_amount(" 42 ").unwrap(), U256::from(42u64));
        assert!(parse_amount("").is_err());
        assert!(parse_amount("12a").is_err());
    }

    #[test]
    fn test_uint_from_str_is_hex() {
        // The uint types keep their own FromStr, separate from parse_amount.
        assert_eq!(U256::from_str("ff").unwrap(), U256::from(255u64));
        assert_eq!(U512::from_str("100").unwrap(), U512::from(256u64));
        assert!(U256::from_str("zz").is_err());
    }

    #[test]
    fn test_to_decimal() {
        let amount = U256::from(1_500_000u64);
        assert_eq!(to_decimal(amount, 6), Some(Decimal::from_str("1.5").unwrap()));
        assert_eq!(to_decimal(U256::MAX, 18), None);
    }

    #[test]
    fn test_serde_adapter() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Holder {
            #[serde(with = "serde_u256")]
            value: U256,
        }

        let holder = Holder { value: U256::from(571_590u64) };
        let json = serde_json::to_string(&holder).unwrap();
        assert_eq!(json, r#"{"value":"571590"}"#);
        let back: Holder = serde_json::from_str(&json).unwrap();
        assert_eq!(back, holder);
    }
}
