//! TokenSwap Common Types
//!
//! Shared types used across the exchange crates: account and token
//! identifiers, fixed-width amount arithmetic, and the error type every
//! crate reports through.

pub mod identifiers;
pub mod amount;
pub mod error;

pub use identifiers::*;
pub use amount::*;
pub use error::*;
