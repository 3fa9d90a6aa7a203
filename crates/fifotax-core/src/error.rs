use chrono::NaiveDate;
use fifotax_fx::FxError;
use fifotax_money::MoneyError;
use iso_currency::Currency;
use thiserror::Error;

/// Errors raised while processing an event stream.
///
/// Every variant is fatal in the sense of §7's policy table: the kernel
/// halts at the first one and returns it alongside the last successfully
/// processed event index. `PriceOracleMiss` from the policy table has no
/// variant here because it is explicitly non-fatal — it is surfaced as
/// [`crate::warning::Warning::PriceRewritten`] instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error(transparent)]
    Fx(#[from] FxError),

    #[error("negative quantity requested from {kind} queue {key}: {quantity}")]
    NegativeQuantity {
        kind: &'static str,
        key: String,
        quantity: rust_decimal::Decimal,
    },

    #[error("pop of {requested} from empty {kind} queue {key}")]
    EmptyQueue {
        kind: &'static str,
        key: String,
        requested: rust_decimal::Decimal,
    },

    #[error("overdraw on {kind} queue {key}: requested {requested}, available {available}")]
    Overdraw {
        kind: &'static str,
        key: String,
        requested: rust_decimal::Decimal,
        available: rust_decimal::Decimal,
    },

    #[error(
        "{kind} queue {key} head lot bought {buy_date} is not yet acquired as of sell date {sell_date}"
    )]
    NotYetAcquired {
        kind: &'static str,
        key: String,
        buy_date: NaiveDate,
        sell_date: NaiveDate,
    },

    #[error("currency {0} is not recognised by the configured rate provider")]
    UnsupportedCurrency(Currency),

    #[error("event {index} ({event}) failed: {source}")]
    EventFailed {
        index: usize,
        event: String,
        #[source]
        source: Box<CoreError>,
    },
}
