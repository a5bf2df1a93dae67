//! Error types for the exchange.

use crate::Address;
use thiserror::Error;

/// Main error type for exchange operations.
///
/// Ledger implementations report through this type as well, so a ledger
/// failure such as [`ExchangeError::AllowanceExceeded`] reaches the swap
/// caller exactly as the ledger raised it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    /// Administrative operation invoked by a non-administrator.
    #[error("Caller {0} is not an administrator")]
    Unauthorized(Address),

    /// Zero-valued rate component.
    #[error("Rate components must be nonzero")]
    InvalidRate,

    /// No rate registered for the requested direction.
    #[error("Token cannot be exchanged")]
    NoRoute { from: Address, to: Address },

    /// Zero input, or an input whose conversion rounds down to zero.
    #[error("Please increase the amount to trade")]
    InvalidAmount,

    /// Conversion leaves a remainder under exact rounding.
    #[error("Invalid amount to swap")]
    InexactConversion,

    /// Caller holds less than the amount to trade.
    #[error("You do not have enough tokens")]
    InsufficientCallerFunds,

    /// Spender allowance below the transfer amount.
    #[error("ERC20: transfer amount exceeds allowance")]
    AllowanceExceeded,

    /// Ledger balance below the transfer amount.
    #[error("ERC20: transfer amount exceeds balance")]
    InsufficientBalance,

    /// The exchange does not hold enough of the output token.
    #[error("We do not have enough tokens. Please try again")]
    InsufficientLiquidity,

    /// Converted amount does not fit in 256 bits.
    #[error("Conversion result exceeds 256 bits")]
    ConversionOverflow,

    /// A credit would push a balance past 256 bits.
    #[error("Balance overflow for {0}")]
    BalanceOverflow(Address),

    /// Malformed or disallowed address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Malformed decimal amount.
    #[error("Invalid amount: {0}")]
    InvalidAmountFormat(String),

    /// Ledger transaction misuse (nested begin, unknown id).
    #[error("Ledger transaction error: {0}")]
    Transaction(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ExchangeError {
    /// Every failure in this core is deterministic for a given state.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Whether the failure was caused by the caller's request or holdings
    /// rather than by the exchange itself.
    pub fn is_caller_fault(&self) -> bool {
        matches!(
            self,
            ExchangeError::Unauthorized(_)
                | ExchangeError::InvalidRate
                | ExchangeError::NoRoute { .. }
                | ExchangeError::InvalidAmount
                | ExchangeError::InexactConversion
                | ExchangeError::InsufficientCallerFunds
                | ExchangeError::AllowanceExceeded
                | ExchangeError::InvalidAddress(_)
                | ExchangeError::InvalidAmountFormat(_)
        )
    }

    /// Get a stable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            ExchangeError::Unauthorized(_) => "UNAUTHORIZED",
            ExchangeError::InvalidRate => "INVALID_RATE",
            ExchangeError::NoRoute { .. } => "NO_ROUTE",
            ExchangeError::InvalidAmount => "INVALID_AMOUNT",
            ExchangeError::InexactConversion => "INEXACT_CONVERSION",
            ExchangeError::InsufficientCallerFunds => "INSUFFICIENT_CALLER_FUNDS",
            ExchangeError::AllowanceExceeded => "ALLOWANCE_EXCEEDED",
            ExchangeError::InsufficientBalance => "INSUFFICIENT_BALANCE",
            ExchangeError::InsufficientLiquidity => "INSUFFICIENT_LIQUIDITY",
            ExchangeError::ConversionOverflow => "CONVERSION_OVERFLOW",
            ExchangeError::BalanceOverflow(_) => "BALANCE_OVERFLOW",
            ExchangeError::InvalidAddress(_) => "INVALID_ADDRESS",
            ExchangeError::InvalidAmountFormat(_) => "INVALID_AMOUNT_FORMAT",
            ExchangeError::Transaction(_) => "TRANSACTION_ERROR",
            ExchangeError::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }
}

/// Result type alias for exchange operations.
pub type Result<T> = std::result::Result<T, ExchangeError>;
