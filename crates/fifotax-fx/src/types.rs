use chrono::NaiveDate;
use iso_currency::Currency;

/// Key identifying a single day's foreign-exchange rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RateKey {
    pub currency: Currency,
    pub date: NaiveDate,
}

impl RateKey {
    pub fn new(currency: Currency, date: NaiveDate) -> Self {
        Self { currency, date }
    }
}
