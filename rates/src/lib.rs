//! TokenSwap Rates
//!
//! Directional exchange rates between token pairs and the integer arithmetic
//! that applies them.
//!
//! # Features
//!
//! - Rate registry keyed by ordered `(from, to)` token pairs
//! - Pluggable administrator checks on writes
//! - Rate-change notifications for observers
//! - 512-bit floor conversion with an optional exact mode
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tokenswap_common::{Address, U256};
//! use tokenswap_rates::{convert, OwnerAuthorizer, RateRegistry};
//!
//! let admin = Address::new("admin");
//! let registry = RateRegistry::new(Arc::new(OwnerAuthorizer::new(admin.clone())));
//!
//! registry.set_rate(&admin, usdt, pkf, U256::from(1_000_000u64), U256::from(571_590u64))?;
//!
//! let rate = registry.lookup(&usdt, &pkf).expect("registered");
//! let out = convert(U256::from(100_000u64), &rate)?; // 57_159
//! ```

pub mod auth;
pub mod conversion;
pub mod rate;
pub mod registry;

pub use auth::{AdminSet, Authorizer, OwnerAuthorizer};
pub use conversion::{convert, convert_with_mode, convert_with_remainder, Conversion, RoundingMode};
pub use rate::{RatePair, TradingPair};
pub use registry::{RateRegistry, RateUpdate};
