use crate::oracle::{LOOKBACK_DAYS, PriceOracle};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// A deterministic, in-memory [`PriceOracle`] backed by caller-supplied
/// close and split series.
///
/// Grounded on the teacher's `FxCache`-style `HashMap`-backed reference
/// store (`cgt_fx::cache::FxCache`), shaped for this crate's ticker-keyed
/// price/split data instead of currency-keyed rates. Useful for tests and
/// small manual datasets; a production deployment backs `PriceOracle` with
/// its own market-data client.
#[derive(Debug, Clone, Default)]
pub struct StaticPriceOracle {
    closes: HashMap<String, Vec<(NaiveDate, Decimal)>>,
    splits: HashMap<String, Vec<(NaiveDate, Decimal)>>,
}

impl StaticPriceOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a close price for `symbol` on `date`. Closes are kept sorted
    /// ascending by date per symbol.
    pub fn insert_close(&mut self, symbol: impl Into<String>, date: NaiveDate, close: Decimal) {
        let entries = self.closes.entry(symbol.into()).or_default();
        insert_sorted(entries, date, close);
    }

    /// Record a stock split for `symbol` on `date` with the given ratio
    /// (shares-after per share-before).
    pub fn insert_split(&mut self, symbol: impl Into<String>, date: NaiveDate, ratio: Decimal) {
        let entries = self.splits.entry(symbol.into()).or_default();
        insert_sorted(entries, date, ratio);
    }
}

fn insert_sorted(entries: &mut Vec<(NaiveDate, Decimal)>, date: NaiveDate, value: Decimal) {
    match entries.binary_search_by_key(&date, |(d, _)| *d) {
        Ok(idx) => entries[idx] = (date, value),
        Err(idx) => entries.insert(idx, (date, value)),
    }
}

impl PriceOracle for StaticPriceOracle {
    fn close_price(&self, symbol: &str, date: NaiveDate) -> Option<Decimal> {
        let series = self.closes.get(symbol)?;

        // Latest entry at or before `date`, within the lookback window.
        let candidate = series
            .iter()
            .rev()
            .find(|(candidate_date, _)| *candidate_date <= date)?;

        let age_days = (date - candidate.0).num_days();
        if age_days <= LOOKBACK_DAYS {
            Some(candidate.1)
        } else {
            None
        }
    }

    fn splits(&self, symbol: &str) -> Vec<(NaiveDate, Decimal)> {
        self.splits.get(symbol).cloned().unwrap_or_default()
    }

    fn latest_close(&self, symbol: &str) -> Option<Decimal> {
        self.closes.get(symbol)?.last().map(|(_, close)| *close)
    }
}
