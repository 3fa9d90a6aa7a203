use crate::error::FxError;
use chrono::NaiveDate;
use iso_currency::Currency;
use rust_decimal::Decimal;
use std::collections::HashSet;

/// A source of domestic-currency reference rates.
///
/// Implementations are read-only collaborators consulted by the FX
/// application layer (`fifotax-core`); they never mutate accounting state.
/// The domestic currency always converts at `1` without touching storage.
pub trait FxRateProvider {
    /// The domestic currency this provider converts everything else into.
    fn domestic_currency(&self) -> Currency;

    /// Domestic units per one unit of `currency` on `date`.
    ///
    /// If the exact date has no rate (weekend, holiday), implementations
    /// advance day-by-day up to 7 calendar days before failing with
    /// [`FxError::RateMissing`].
    fn daily_rate(&self, currency: Currency, date: NaiveDate) -> Result<Decimal, FxError>;

    /// The unweighted mean of `(year, month)`'s daily rates.
    fn monthly_rate(&self, currency: Currency, year: i32, month: u32)
    -> Result<Decimal, FxError>;

    /// The set of currencies this provider recognises (including domestic).
    fn supported(&self) -> HashSet<Currency>;
}
