//! Fixed-point decimal and date primitives.
//!
//! The accounting path never touches binary floating point. Every amount,
//! price, quantity and rate in this workspace is an exact [`Decimal`];
//! rounding only ever happens at presentation boundaries, using half-up
//! quantisation to a requested exponent.

use crate::error::MoneyError;
use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Absolute tolerance below which a quantity is treated as zero.
pub const EPSILON_ZERO: Decimal = Decimal::from_parts(1, 0, 0, false, 10);

/// One unit of the smallest displayable denomination (cents).
pub const DUST_THRESHOLD: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Parse a decimal amount from a locale-agnostic textual form.
///
/// Adapters are responsible for stripping currency glyphs and thousands
/// separators before the value reaches this path; this function only
/// accepts plain numeric text (e.g. `"1234.56"`, `"-12"`).
pub fn parse_decimal(text: &str) -> Result<Decimal, MoneyError> {
    let trimmed = text.trim();
    Decimal::from_str(trimmed).map_err(|_| MoneyError::ParseError(text.to_string()))
}

/// Divide `numerator` by `denominator`, failing on division by zero.
pub fn checked_div(numerator: Decimal, denominator: Decimal) -> Result<Decimal, MoneyError> {
    if denominator.is_zero() {
        return Err(MoneyError::ArithmeticError(format!(
            "division by zero: {numerator} / {denominator}"
        )));
    }
    Ok(numerator / denominator)
}

/// Quantise `value` to `exponent` decimal places using half-up rounding.
///
/// `exponent` is the number of digits after the decimal point (e.g. `2` for
/// cents). This is the only rounding mode used anywhere in the accounting
/// path, and only ever at presentation boundaries.
pub fn quantize(value: Decimal, exponent: u32) -> Decimal {
    value.round_dp_with_strategy(exponent, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns true if `value`'s absolute magnitude is below [`EPSILON_ZERO`].
pub fn is_approximately_zero(value: Decimal) -> bool {
    value.abs() < EPSILON_ZERO
}

/// Returns true if `value`'s absolute magnitude is below [`DUST_THRESHOLD`].
pub fn is_dust(value: Decimal) -> bool {
    value.abs() < DUST_THRESHOLD
}

/// The earlier of two dates.
pub fn min_date(a: NaiveDate, b: NaiveDate) -> NaiveDate {
    if a <= b { a } else { b }
}

/// `date` advanced by `days` calendar days (negative shifts backward).
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date + chrono::Duration::days(days)
}

/// The civil year of `date`.
pub fn year_of(date: NaiveDate) -> i32 {
    date.year()
}
