use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Relative tolerance within which a quoted price is considered to already
/// agree with the oracle's split-adjusted close ("historic").
pub const HISTORIC_TOLERANCE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// Number of calendar days `close_price` looks backward for the nearest
/// prior trading day when the exact date has no quote.
pub const LOOKBACK_DAYS: i64 = 30;

/// A read-only source of historical closing prices and stock-split
/// schedules, keyed by ticker symbol.
///
/// Implementations are consulted by the event-normalisation step
/// (component D) to decide whether an imported price is already
/// split-adjusted, and never mutate accounting state.
pub trait PriceOracle {
    /// The split-adjusted close on `date`, or the latest prior trading day
    /// within a 30-day lookback window. `None` if the ticker is unknown to
    /// this oracle, or if no quote falls within the lookback window.
    fn close_price(&self, symbol: &str, date: NaiveDate) -> Option<Decimal>;

    /// This ticker's split schedule, sorted ascending by date. Each entry's
    /// ratio is shares-after per share-before (`2` for a 2-for-1 split,
    /// `0.5` for a 1-for-2 reverse split). Empty if the ticker is unknown.
    fn splits(&self, symbol: &str) -> Vec<(NaiveDate, Decimal)>;

    /// The most recent known close for `symbol`, or `None` if unknown.
    fn latest_close(&self, symbol: &str) -> Option<Decimal>;

    /// Whether `price` already agrees with the oracle's split-adjusted
    /// close for `symbol` on `date`, within [`HISTORIC_TOLERANCE`].
    ///
    /// Returns `(true, None)` when the oracle has no data for this ticker —
    /// such a price is treated as historic since there is nothing to rewrite
    /// it against. Returns `(false, Some(baseline))` when the oracle has
    /// data and `price` deviates beyond tolerance, in which case `baseline`
    /// is the reference close the caller should use to derive the implied
    /// split factor.
    fn is_historic(&self, price: Decimal, symbol: &str, date: NaiveDate) -> (bool, Option<Decimal>) {
        let Some(baseline) = self.close_price(symbol, date) else {
            return (true, None);
        };

        if baseline.is_zero() {
            return (true, Some(baseline));
        }

        let relative_deviation = (price - baseline).abs() / baseline;
        (relative_deviation <= HISTORIC_TOLERANCE, Some(baseline))
    }
}
