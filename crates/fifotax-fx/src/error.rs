use chrono::NaiveDate;
use iso_currency::Currency;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FxError {
    #[error("no {currency} rate within 7 days of {date}")]
    RateMissing { currency: Currency, date: NaiveDate },

    #[error("no {currency} rate for {year}-{month:02}")]
    MonthlyRateMissing {
        currency: Currency,
        year: i32,
        month: u32,
    },

    #[error("currency {0} is not recognised by the configured rate provider")]
    UnsupportedCurrency(Currency),
}
