//! Fixed-point amount conversion.
//!
//! `output = floor(amount * to_amount / from_amount)`, computed in 512 bits.
//! There is no decimal-place inference: a rate is a raw base-unit ratio and
//! whoever configures it accounts for each token's precision.

use serde::{Deserialize, Serialize};
use tokenswap_common::{narrow, widen, ExchangeError, Result, U256};

use crate::rate::RatePair;

/// How a conversion remainder is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Truncate toward zero; the remainder stays with the exchange.
    #[default]
    Floor,
    /// Reject any conversion that leaves a remainder.
    Exact,
}

impl std::str::FromStr for RoundingMode {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "floor" => Ok(RoundingMode::Floor),
            "exact" => Ok(RoundingMode::Exact),
            other => Err(ExchangeError::Configuration(format!(
                "unknown rounding mode '{}'",
                other
            ))),
        }
    }
}

/// Result of converting an amount through a rate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conversion {
    /// Floored output in destination base units.
    pub output: U256,
    /// `amount * to_amount mod from_amount`; zero for an exact conversion.
    pub remainder: U256,
}

impl Conversion {
    /// Whether the conversion divided evenly.
    pub fn is_exact(&self) -> bool {
        self.remainder.is_zero()
    }
}

/// Convert `amount` through `rate`, truncating toward zero.
pub fn convert(amount: U256, rate: &RatePair) -> Result<U256> {
    convert_with_remainder(amount, rate).map(|c| c.output)
}

/// Convert `amount` through `rate`, also reporting the remainder.
///
/// Fails only with [`ExchangeError::ConversionOverflow`] when the quotient
/// does not fit in 256 bits.
pub fn convert_with_remainder(amount: U256, rate: &RatePair) -> Result<Conversion> {
    // Both factors are below 2^256, so the product is below 2^512.
    let product = widen(amount) * widen(rate.to_amount());
    let divisor = widen(rate.from_amount());
    let (quotient, remainder) = product.div_mod(divisor);

    let output = narrow(quotient).ok_or(ExchangeError::ConversionOverflow)?;
    // remainder < divisor <= U256::MAX
    let remainder = narrow(remainder).ok_or(ExchangeError::ConversionOverflow)?;

    Ok(Conversion { output, remainder })
}

/// Convert under the given rounding mode, for settlement.
///
/// An output that rounds to zero is [`ExchangeError::InvalidAmount`] in every
/// mode, and is reported before an inexact remainder.
pub fn convert_with_mode(amount: U256, rate: &RatePair, mode: RoundingMode) -> Result<U256> {
    let conversion = convert_with_remainder(amount, rate)?;
    if conversion.output.is_zero() {
        return Err(ExchangeError::InvalidAmount);
    }
    match mode {
        RoundingMode::Floor => Ok(conversion.output),
        RoundingMode::Exact if conversion.is_exact() => Ok(conversion.output),
        RoundingMode::Exact => Err(ExchangeError::InexactConversion),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rate(a: u64, b: u64) -> RatePair {
        RatePair::from_u64(a, b).unwrap()
    }

    #[test]
    fn test_convert_usdt_to_pkf() {
        let out = convert(U256::from(100_000u64), &rate(1_000_000, 571_590)).unwrap();
        assert_eq!(out, U256::from(57_159u64));
    }

    #[test]
    fn test_convert_truncates() {
        let conversion =
            convert_with_remainder(U256::from(1_000_000u64), &rate(3, 1)).unwrap();
        assert_eq!(conversion.output, U256::from(333_333u64));
        assert_eq!(conversion.remainder, U256::from(1u64));
        assert!(!conversion.is_exact());
    }

    #[test]
    fn test_small_amount_rounds_to_zero() {
        let out = convert(U256::from(2u64), &rate(3, 1)).unwrap();
        assert!(out.is_zero());
    }

    #[test]
    fn test_no_intermediate_overflow() {
        // amount * to_amount is far beyond 256 bits, the quotient is not.
        let big = U256::MAX;
        let out = convert(big, &RatePair::new(big, big).unwrap()).unwrap();
        assert_eq!(out, big);
    }

    #[test]
    fn test_quotient_overflow() {
        let result = convert(U256::MAX, &rate(1, 2));
        assert_eq!(result, Err(ExchangeError::ConversionOverflow));
    }

    #[test]
    fn test_mode_rejects_zero_output_first() {
        let r = rate(3, 1);
        for mode in [RoundingMode::Floor, RoundingMode::Exact] {
            assert_eq!(
                convert_with_mode(U256::from(2u64), &r, mode),
                Err(ExchangeError::InvalidAmount)
            );
            assert_eq!(
                convert_with_mode(U256::zero(), &r, mode),
                Err(ExchangeError::InvalidAmount)
            );
        }
    }

    #[test]
    fn test_exact_mode() {
        let r = rate(3, 1);
        assert_eq!(
            convert_with_mode(U256::from(30u64), &r, RoundingMode::Exact).unwrap(),
            U256::from(10u64)
        );
        assert_eq!(
            convert_with_mode(U256::from(31u64), &r, RoundingMode::Exact),
            Err(ExchangeError::InexactConversion)
        );
        assert_eq!(
            convert_with_mode(U256::from(31u64), &r, RoundingMode::Floor).unwrap(),
            U256::from(10u64)
        );
    }

    #[test]
    fn test_rounding_mode_parse() {
        assert_eq!("Floor".parse::<RoundingMode>().unwrap(), RoundingMode::Floor);
        assert_eq!("exact".parse::<RoundingMode>().unwrap(), RoundingMode::Exact);
        assert!("ceil".parse::<RoundingMode>().is_err());
    }

    proptest! {
        #[test]
        fn prop_matches_u128_floor(
            amount in 0u64..=u64::MAX,
            from in 1u64..=u64::MAX,
            to in 1u64..=u64::MAX,
        ) {
            let expected = (amount as u128 * to as u128) / from as u128;
            let out = convert(U256::from(amount), &rate(from, to)).unwrap();
            prop_assert_eq!(out, U256::from(expected));
        }

        #[test]
        fn prop_floor_is_tight(
            amount in 1u64..=u64::MAX,
            from in 1u64..=u64::MAX,
            to in 1u64..=u64::MAX,
        ) {
            let r = rate(from, to);
            let c = convert_with_remainder(U256::from(amount), &r).unwrap();
            // output * from + remainder == amount * to, remainder < from
            let lhs = c.output * U256::from(from) + c.remainder;
            prop_assert_eq!(lhs, U256::from(amount) * U256::from(to));
            prop_assert!(c.remainder < U256::from(from));
        }
    }
}
