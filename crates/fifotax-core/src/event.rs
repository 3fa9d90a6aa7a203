//! The normalised brokerage-event stream (component D).
//!
//! Every event carries a `date` and an integer `priority`; events are
//! processed in ascending `(date, priority)` order with input-order
//! tie-breaking (§4.D). Grounded on the teacher's `Operation<M>` — a single
//! `#[serde(tag = "...")]` enum with inline named fields per variant, giving
//! exhaustive `match` at construction and at kernel dispatch instead of the
//! original Python's per-class `isinstance` chain (§9 "polymorphic event
//! dispatch").
//!
//! Normalisation-at-construction (the historic/implied-split-factor
//! rewrite) is not baked into the constructors themselves: it is run once,
//! up front, by [`normalize_events`], which is the first thing
//! [`crate::kernel::Kernel::process`] does with the raw stream. This keeps
//! the [`fifotax_price::PriceOracle`] collaborator out of the event type
//! itself (only the kernel holds collaborators, per §9's "global
//! singletons" note) while still satisfying "applied once per event, before
//! any queue mutation sees it".

use crate::warning::Warning;
use chrono::NaiveDate;
use fifotax_money::Currency;
use fifotax_price::PriceOracle;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// At most one of `withheld`/`reverted` can be meaningful on a [`Event::Tax`]
/// event; a tagged variant makes that exclusivity a compile-time property
/// instead of two optional fields a caller could set both of.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaxAdjustment {
    Withheld { amount: Decimal },
    Reverted { amount: Decimal },
}

/// A single brokerage event in the normalised ingest stream (§6).
///
/// `imported_*` fields carry the value as originally quoted by the broker;
/// `historic_*` fields carry the split-adjusted value actually used in
/// accounting from the moment [`normalize_events`] has run. Before that,
/// both pairs are equal. Variants with no share quantity/price of their own
/// (`Dividend`, `Tax`, `MoneyDeposit`, `MoneyWithdrawal`,
/// `CurrencyConversion`, `StockSplit`) carry no historic/imported split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    RsuVest {
        symbol: String,
        date: NaiveDate,
        currency: Currency,
        imported_qty: Decimal,
        imported_price: Decimal,
        /// Computed by [`normalize_events`] from `imported_price`; an
        /// ingest adapter need not supply this (it is overwritten on the
        /// first normalisation pass regardless of what it sets).
        #[serde(default)]
        historic_qty: Decimal,
        #[serde(default)]
        historic_price: Decimal,
        /// Shares sold-to-cover tax at vest, split-normalised alongside
        /// `historic_qty`. `None` when the full vest lands unwithheld.
        #[serde(default)]
        withheld_qty: Option<Decimal>,
        #[serde(default)]
        grant_id: Option<String>,
    },
    EsppPurchase {
        symbol: String,
        date: NaiveDate,
        currency: Currency,
        imported_qty: Decimal,
        imported_purchase_price: Decimal,
        imported_fair_market_value: Decimal,
        #[serde(default)]
        historic_qty: Decimal,
        #[serde(default)]
        historic_purchase_price: Decimal,
        #[serde(default)]
        historic_fair_market_value: Decimal,
    },
    Dividend {
        symbol: String,
        date: NaiveDate,
        currency: Currency,
        amount: Decimal,
    },
    Tax {
        symbol: String,
        date: NaiveDate,
        currency: Currency,
        adjustment: TaxAdjustment,
    },
    Buy {
        symbol: String,
        date: NaiveDate,
        currency: Currency,
        imported_qty: Decimal,
        imported_price: Decimal,
        #[serde(default)]
        historic_qty: Decimal,
        #[serde(default)]
        historic_price: Decimal,
        /// Actual cash debited; usually `qty * price` but supplied
        /// separately for audit (broker rounding, bundled odd-lot fees).
        cost_of_shares: Decimal,
        #[serde(default)]
        fees: Option<Decimal>,
        #[serde(default)]
        txn_id: Option<String>,
    },
    Sell {
        symbol: String,
        date: NaiveDate,
        currency: Currency,
        imported_qty: Decimal,
        imported_price: Decimal,
        #[serde(default)]
        historic_qty: Decimal,
        #[serde(default)]
        historic_price: Decimal,
        /// Actual cash credited; usually `qty * price`, audit field.
        proceeds: Decimal,
        #[serde(default)]
        fees: Option<Decimal>,
        #[serde(default)]
        txn_id: Option<String>,
    },
    MoneyDeposit {
        date: NaiveDate,
        /// Origin-of-funds date; the pushed [`crate::models::CashLot`] is
        /// ordered and speculative-period-tested against this, not `date`.
        buy_date: NaiveDate,
        currency: Currency,
        amount: Decimal,
        #[serde(default)]
        fees: Option<Decimal>,
    },
    MoneyWithdrawal {
        date: NaiveDate,
        buy_date: NaiveDate,
        currency: Currency,
        amount: Decimal,
        #[serde(default)]
        fees: Option<Decimal>,
    },
    CurrencyConversion {
        date: NaiveDate,
        source_ccy: Currency,
        source_amount: Decimal,
        target_ccy: Currency,
        /// A negative value is the documented sentinel for "converted to
        /// domestic via the reference rate, with no foreign-queue effect":
        /// the source currency is sold but nothing is pushed anywhere.
        target_amount: Decimal,
        #[serde(default)]
        fees: Option<Decimal>,
    },
    StockSplit {
        symbol: String,
        date: NaiveDate,
        ratio: Decimal,
    },
}

impl Event {
    pub fn rsu_vest(
        symbol: impl Into<String>,
        date: NaiveDate,
        currency: Currency,
        received_qty: Decimal,
        received_price: Decimal,
        withheld_qty: Option<Decimal>,
        grant_id: Option<String>,
    ) -> Self {
        Event::RsuVest {
            symbol: symbol.into(),
            date,
            currency,
            imported_qty: received_qty,
            imported_price: received_price,
            historic_qty: received_qty,
            historic_price: received_price,
            withheld_qty,
            grant_id,
        }
    }

    pub fn espp_purchase(
        symbol: impl Into<String>,
        date: NaiveDate,
        currency: Currency,
        qty: Decimal,
        purchase_price: Decimal,
        fair_market_value: Decimal,
    ) -> Self {
        Event::EsppPurchase {
            symbol: symbol.into(),
            date,
            currency,
            imported_qty: qty,
            imported_purchase_price: purchase_price,
            imported_fair_market_value: fair_market_value,
            historic_qty: qty,
            historic_purchase_price: purchase_price,
            historic_fair_market_value: fair_market_value,
        }
    }

    pub fn buy(
        symbol: impl Into<String>,
        date: NaiveDate,
        currency: Currency,
        qty: Decimal,
        price: Decimal,
        cost_of_shares: Decimal,
        fees: Option<Decimal>,
        txn_id: Option<String>,
    ) -> Self {
        Event::Buy {
            symbol: symbol.into(),
            date,
            currency,
            imported_qty: qty,
            imported_price: price,
            historic_qty: qty,
            historic_price: price,
            cost_of_shares,
            fees,
            txn_id,
        }
    }

    pub fn sell(
        symbol: impl Into<String>,
        date: NaiveDate,
        currency: Currency,
        qty: Decimal,
        price: Decimal,
        proceeds: Decimal,
        fees: Option<Decimal>,
        txn_id: Option<String>,
    ) -> Self {
        Event::Sell {
            symbol: symbol.into(),
            date,
            currency,
            imported_qty: qty,
            imported_price: price,
            historic_qty: qty,
            historic_price: price,
            proceeds,
            fees,
            txn_id,
        }
    }

    /// The calendar day this event occurs on.
    pub fn date(&self) -> NaiveDate {
        match self {
            Event::RsuVest { date, .. }
            | Event::EsppPurchase { date, .. }
            | Event::Dividend { date, .. }
            | Event::Tax { date, .. }
            | Event::Buy { date, .. }
            | Event::Sell { date, .. }
            | Event::MoneyDeposit { date, .. }
            | Event::MoneyWithdrawal { date, .. }
            | Event::CurrencyConversion { date, .. }
            | Event::StockSplit { date, .. } => *date,
        }
    }

    /// This event's processing priority on its date, lower runs first
    /// (§4.D). `CurrencyConversion`'s priority depends on whether the
    /// source/target legs are the configured domestic currency.
    pub fn priority(&self, domestic: Currency) -> u8 {
        match self {
            Event::RsuVest { .. } | Event::EsppPurchase { .. } => 0,
            Event::Dividend { .. } => 1,
            Event::Tax { .. } => 2,
            Event::MoneyDeposit { .. } => 3,
            Event::CurrencyConversion {
                source_ccy,
                target_ccy,
                ..
            } => {
                if *source_ccy == domestic {
                    4
                } else if *target_ccy == domestic || is_domestic_sentinel_conversion(self) {
                    8
                } else {
                    6
                }
            }
            Event::Sell { .. } => 5,
            Event::Buy { .. } => 7,
            Event::MoneyWithdrawal { .. } => 9,
            Event::StockSplit { .. } => 10,
        }
    }

    /// Symbol this event concerns, if it carries one (used for error
    /// context and display only — queues are keyed independently).
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Event::RsuVest { symbol, .. }
            | Event::EsppPurchase { symbol, .. }
            | Event::Dividend { symbol, .. }
            | Event::Tax { symbol, .. }
            | Event::Buy { symbol, .. }
            | Event::Sell { symbol, .. }
            | Event::StockSplit { symbol, .. } => Some(symbol),
            Event::MoneyDeposit { .. }
            | Event::MoneyWithdrawal { .. }
            | Event::CurrencyConversion { .. } => None,
        }
    }
}

fn is_domestic_sentinel_conversion(event: &Event) -> bool {
    matches!(event, Event::CurrencyConversion { target_amount, .. } if *target_amount < Decimal::ZERO)
}

/// The implied past-split factor `k = round(oracle_close / price)` for a
/// quoted `price`, plus any warning raised while deriving it. `k = 1` (no
/// rewrite) when the price already agrees with the oracle within tolerance,
/// or when the oracle has no data for this ticker (treated as historic,
/// [`Warning::PriceOracleMiss`] per §7's non-fatal policy).
fn split_factor(
    oracle: &dyn PriceOracle,
    symbol: &str,
    date: NaiveDate,
    price: Decimal,
) -> (Decimal, Option<Warning>) {
    let (historic, baseline) = oracle.is_historic(price, symbol, date);
    let Some(baseline) = baseline else {
        return (
            Decimal::ONE,
            Some(Warning::PriceOracleMiss {
                symbol: symbol.to_string(),
                date,
            }),
        );
    };

    if historic || price.is_zero() {
        return (Decimal::ONE, None);
    }

    let k = (baseline / price).round();
    if k.is_zero() {
        return (Decimal::ONE, None);
    }

    (
        k,
        Some(Warning::PriceRewritten {
            symbol: symbol.to_string(),
            date,
            imported_price: price,
            historic_price: price * k,
            implied_split_factor: k,
        }),
    )
}

/// Run split-normalisation once over every event carrying a quoted share
/// quantity/price pair, rewriting `historic_qty`/`historic_price` (and any
/// sibling quantities such as `withheld_qty`) onto a post-split-adjusted
/// basis. Non-share events pass through unchanged. Returns the normalised
/// events alongside any warnings raised (R3: idempotent on an
/// already-historic price, since `k = 1` leaves the pair unchanged).
pub fn normalize_events(events: Vec<Event>, oracle: &dyn PriceOracle) -> (Vec<Event>, Vec<Warning>) {
    let mut warnings = Vec::new();
    let normalized = events
        .into_iter()
        .map(|event| normalize_one(event, oracle, &mut warnings))
        .collect();
    (normalized, warnings)
}

fn normalize_one(event: Event, oracle: &dyn PriceOracle, warnings: &mut Vec<Warning>) -> Event {
    match event {
        Event::RsuVest {
            symbol,
            date,
            currency,
            imported_qty,
            imported_price,
            withheld_qty,
            grant_id,
            ..
        } => {
            let (k, warning) = split_factor(oracle, &symbol, date, imported_price);
            if let Some(w) = warning {
                warnings.push(w);
            }
            Event::RsuVest {
                symbol,
                date,
                currency,
                imported_qty,
                imported_price,
                historic_qty: imported_qty / k,
                historic_price: imported_price * k,
                withheld_qty: withheld_qty.map(|q| q / k),
                grant_id,
            }
        }
        Event::EsppPurchase {
            symbol,
            date,
            currency,
            imported_qty,
            imported_purchase_price,
            imported_fair_market_value,
            ..
        } => {
            let (k, warning) = split_factor(oracle, &symbol, date, imported_fair_market_value);
            if let Some(w) = warning {
                warnings.push(w);
            }
            Event::EsppPurchase {
                symbol,
                date,
                currency,
                imported_qty,
                imported_purchase_price,
                imported_fair_market_value,
                historic_qty: imported_qty / k,
                historic_purchase_price: imported_purchase_price * k,
                historic_fair_market_value: imported_fair_market_value * k,
            }
        }
        Event::Buy {
            symbol,
            date,
            currency,
            imported_qty,
            imported_price,
            cost_of_shares,
            fees,
            txn_id,
            ..
        } => {
            let (k, warning) = split_factor(oracle, &symbol, date, imported_price);
            if let Some(w) = warning {
                warnings.push(w);
            }
            Event::Buy {
                symbol,
                date,
                currency,
                imported_qty,
                imported_price,
                historic_qty: imported_qty / k,
                historic_price: imported_price * k,
                cost_of_shares,
                fees,
                txn_id,
            }
        }
        Event::Sell {
            symbol,
            date,
            currency,
            imported_qty,
            imported_price,
            proceeds,
            fees,
            txn_id,
            ..
        } => {
            let (k, warning) = split_factor(oracle, &symbol, date, imported_price);
            if let Some(w) = warning {
                warnings.push(w);
            }
            Event::Sell {
                symbol,
                date,
                currency,
                imported_qty,
                imported_price,
                historic_qty: imported_qty / k,
                historic_price: imported_price * k,
                proceeds,
                fees,
                txn_id,
            }
        }
        other => other,
    }
}
