//! tCurrency Common Types
//!
//! Shared types used across the tCurrency converter crates: currency codes,
//! the static currency catalog, amount parsing/formatting and time helpers.

pub mod currency;
pub mod catalog;
pub mod amount;
pub mod time;

pub use currency::*;
pub use catalog::{CurrencyDescriptor, CurrencyInfo};
pub use amount::{format_amount, parse_amount};
pub use time::*;
