//! Fixed-point decimal, date, and currency-amount primitives.
//!
//! This crate carries no FX- or price-data concerns of its own — those are
//! `fifotax-fx` and `fifotax-price` respectively. It only knows how to
//! represent an exact monetary amount and how to round it.

mod amount;
mod decimal;
mod error;

pub use amount::CurrencyAmount;
pub use decimal::{
    DUST_THRESHOLD, EPSILON_ZERO, add_days, checked_div, is_approximately_zero, is_dust,
    min_date, parse_decimal, quantize, year_of,
};
pub use error::MoneyError;
pub use iso_currency::Currency;

use rust_decimal::Decimal;

/// The additive identity, re-exported for call sites that prefer the
/// `money::ZERO` / `money::ONE` spelling used throughout this workspace.
pub const ZERO: Decimal = Decimal::ZERO;
pub const ONE: Decimal = Decimal::ONE;
