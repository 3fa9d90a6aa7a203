use crate::error::FxError;
use crate::provider::FxRateProvider;
use crate::types::RateKey;
use chrono::{Datelike, NaiveDate};
use iso_currency::Currency;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

/// Maximum number of calendar days the daily lookup advances past an
/// exact-date miss before giving up.
const MAX_LOOKAHEAD_DAYS: i64 = 7;

/// An in-memory, deterministic reference rate store.
///
/// Grounded on the teacher's `FxCache`/`RateEntry` shape
/// (`HashMap<RateKey, RateEntry>`), generalised from a single fixed domestic
/// currency and monthly-only granularity to an arbitrary configured
/// domestic currency with daily granularity (monthly rates are derived from
/// the cached daily series rather than stored separately).
#[derive(Debug, Clone)]
pub struct FxCache {
    domestic: Currency,
    rates: HashMap<RateKey, Decimal>,
}

impl FxCache {
    pub fn new(domestic: Currency) -> Self {
        Self {
            domestic,
            rates: HashMap::new(),
        }
    }

    /// Insert a single day's rate (domestic units per one unit of `currency`).
    pub fn insert(&mut self, currency: Currency, date: NaiveDate, rate: Decimal) {
        self.rates.insert(RateKey::new(currency, date), rate);
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = (Currency, NaiveDate, Decimal)>) {
        for (currency, date, rate) in entries {
            self.insert(currency, date, rate);
        }
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl FxRateProvider for FxCache {
    fn domestic_currency(&self) -> Currency {
        self.domestic
    }

    fn daily_rate(&self, currency: Currency, date: NaiveDate) -> Result<Decimal, FxError> {
        if currency == self.domestic {
            return Ok(Decimal::ONE);
        }

        for offset in 0..=MAX_LOOKAHEAD_DAYS {
            let candidate = date + chrono::Duration::days(offset);
            if let Some(rate) = self.rates.get(&RateKey::new(currency, candidate)) {
                return Ok(*rate);
            }
        }

        Err(FxError::RateMissing { currency, date })
    }

    fn monthly_rate(
        &self,
        currency: Currency,
        year: i32,
        month: u32,
    ) -> Result<Decimal, FxError> {
        if currency == self.domestic {
            return Ok(Decimal::ONE);
        }

        let matching: Vec<Decimal> = self
            .rates
            .iter()
            .filter(|(key, _)| {
                key.currency == currency && key.date.year() == year && key.date.month() == month
            })
            .map(|(_, rate)| *rate)
            .collect();

        if matching.is_empty() {
            return Err(FxError::MonthlyRateMissing {
                currency,
                year,
                month,
            });
        }

        let count = Decimal::from(matching.len() as u64);
        let sum: Decimal = matching.into_iter().sum();
        Ok(sum / count)
    }

    fn supported(&self) -> HashSet<Currency> {
        let mut set: HashSet<Currency> = self.rates.keys().map(|key| key.currency).collect();
        set.insert(self.domestic);
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn domestic_currency_always_one() {
        let cache = FxCache::new(Currency::EUR);
        assert_eq!(
            cache.daily_rate(Currency::EUR, date(2024, 1, 1)).unwrap(),
            Decimal::ONE
        );
        assert_eq!(
            cache.monthly_rate(Currency::EUR, 2024, 1).unwrap(),
            Decimal::ONE
        );
    }

    #[test]
    fn daily_rate_advances_on_missing_date() {
        let mut cache = FxCache::new(Currency::EUR);
        // Friday rate present, weekend (Sat/Sun) absent.
        cache.insert(Currency::USD, date(2024, 3, 1), dec!(1.10));

        // Saturday and Sunday should fall back to Friday's rate.
        assert_eq!(
            cache.daily_rate(Currency::USD, date(2024, 3, 2)).unwrap(),
            dec!(1.10)
        );
        assert_eq!(
            cache.daily_rate(Currency::USD, date(2024, 3, 3)).unwrap(),
            dec!(1.10)
        );
    }

    #[test]
    fn daily_rate_fails_beyond_seven_days() {
        let mut cache = FxCache::new(Currency::EUR);
        cache.insert(Currency::USD, date(2024, 3, 9), dec!(1.12));

        // The nearest rate is 8 days after the requested date — out of window.
        let result = cache.daily_rate(Currency::USD, date(2024, 3, 1));
        assert!(matches!(result, Err(FxError::RateMissing { .. })));
    }

    #[test]
    fn monthly_rate_is_unweighted_mean() {
        let mut cache = FxCache::new(Currency::EUR);
        cache.insert(Currency::USD, date(2024, 3, 1), dec!(1.00));
        cache.insert(Currency::USD, date(2024, 3, 15), dec!(1.10));
        cache.insert(Currency::USD, date(2024, 3, 31), dec!(1.30));

        let mean = cache.monthly_rate(Currency::USD, 2024, 3).unwrap();
        assert_eq!(mean.round_dp(10), dec!(1.1333333333));
    }

    #[test]
    fn monthly_rate_missing_errors() {
        let cache = FxCache::new(Currency::EUR);
        assert!(matches!(
            cache.monthly_rate(Currency::USD, 2024, 3),
            Err(FxError::MonthlyRateMissing { .. })
        ));
    }

    #[test]
    fn supported_includes_domestic_and_cached_currencies() {
        let mut cache = FxCache::new(Currency::EUR);
        cache.insert(Currency::USD, date(2024, 1, 1), dec!(1.1));
        let supported = cache.supported();
        assert!(supported.contains(&Currency::EUR));
        assert!(supported.contains(&Currency::USD));
    }
}
