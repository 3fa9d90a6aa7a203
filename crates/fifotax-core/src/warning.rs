use chrono::NaiveDate;
use iso_currency::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Non-fatal conditions collected during processing and valuation and
/// returned to the caller alongside the report rather than halting or being
/// printed inline.
///
/// Grounded on `pyfifotax`'s `report_data.py`/`v2/src/core/fifo_processor.py`
/// warnings accumulator, formalised into a typed enum per the teacher's
/// preference for typed diagnostics over free-text strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Warning {
    /// A queue's residual total fell below [`fifotax_money::DUST_THRESHOLD`]
    /// and its remaining lots were discarded.
    DustCleared { kind: &'static str, key: String },

    /// A cash pop exceeded the available total by less than one unit and was
    /// silently clamped to the available amount (broker-rounding tolerance).
    CashOverdrawClamped { currency: Currency, shortfall: Decimal },

    /// An imported price disagreed with the price oracle's split-adjusted
    /// close and was rewritten onto a historic (split-adjusted) basis.
    PriceRewritten {
        symbol: String,
        date: NaiveDate,
        imported_price: Decimal,
        historic_price: Decimal,
        implied_split_factor: Decimal,
    },

    /// The price oracle had no data for this ticker/date; the imported price
    /// was accepted as-is (treated as already historic).
    PriceOracleMiss { symbol: String, date: NaiveDate },
}
