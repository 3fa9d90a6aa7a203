//! Lot, sold-lot, cash-flow and AWV entities.
//!
//! Every public entity here derives `Debug, Clone, PartialEq, Serialize,
//! Deserialize` the way `cgt_core::models` does, so report tables can be
//! handed to an external renderer as plain JSON.

use chrono::NaiveDate;
use fifotax_money::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a [`ShareLot`] came into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareLotSource {
    RsuVest,
    EsppPurchase,
    Buy,
}

/// How a [`CashLot`] came into existence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum CashLotSource {
    Dividend { symbol: String },
    Deposit,
    SaleProceeds { symbol: String },
    CurrencyConversion { from: Currency, to: Currency },
    TaxReverted,
}

/// A holding of `quantity` shares of `symbol` acquired on `buy_date`.
///
/// `cumulative_split_factor` starts at `1` and accumulates every
/// [`crate::queue::ShareQueue::apply_split`] applied while the lot is held.
/// `original_buy_price` is populated the first time a split is applied and
/// is carried for audit only — it has no effect on gain computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareLot {
    pub symbol: String,
    pub quantity: Decimal,
    pub buy_date: NaiveDate,
    pub buy_price: Decimal,
    pub currency: Currency,
    pub source: ShareLotSource,
    pub buy_cost: Option<Decimal>,
    pub buy_cost_currency: Option<Currency>,
    pub original_buy_price: Option<Decimal>,
    pub cumulative_split_factor: Decimal,
    pub grant_id: Option<String>,
}

impl ShareLot {
    pub fn new(
        symbol: impl Into<String>,
        quantity: Decimal,
        buy_date: NaiveDate,
        buy_price: Decimal,
        currency: Currency,
        source: ShareLotSource,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            buy_date,
            buy_price,
            currency,
            source,
            buy_cost: None,
            buy_cost_currency: None,
            original_buy_price: None,
            cumulative_split_factor: Decimal::ONE,
            grant_id: None,
        }
    }
}

impl std::fmt::Display for ShareLot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} @ {} {} ({})",
            self.quantity, self.symbol, self.buy_price, self.currency, self.buy_date
        )
    }
}

/// A holding of `quantity` units of `currency` acquired on `buy_date`.
///
/// `tax_free` is set for cash originating from dividends or RSU/ESPP bonus
/// components, which are exempt from the foreign-exchange speculation rule
/// regardless of holding period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashLot {
    pub currency: Currency,
    pub quantity: Decimal,
    pub buy_date: NaiveDate,
    pub source: CashLotSource,
    pub tax_free: bool,
}

impl CashLot {
    pub fn new(
        currency: Currency,
        quantity: Decimal,
        buy_date: NaiveDate,
        source: CashLotSource,
        tax_free: bool,
    ) -> Self {
        Self {
            currency,
            quantity,
            buy_date,
            source,
            tax_free,
        }
    }
}

impl std::fmt::Display for CashLot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.quantity, self.currency, self.buy_date)
    }
}

/// Domestic-currency buy/sell/cost/gain values computed once per rate mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomesticValuation {
    pub buy_price_dom: Decimal,
    pub sell_price_dom: Decimal,
    pub cost_dom: Decimal,
    pub gain_dom: Decimal,
}

/// A [`ShareLot`] augmented with sell data and (once FX application has run)
/// domestic-currency valuations in both rate modes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoldShareLot {
    pub symbol: String,
    pub quantity: Decimal,
    pub buy_date: NaiveDate,
    pub buy_price: Decimal,
    pub currency: Currency,
    pub source: ShareLotSource,
    pub buy_cost: Option<Decimal>,
    pub buy_cost_currency: Option<Currency>,
    pub original_buy_price: Option<Decimal>,
    pub cumulative_split_factor: Decimal,
    pub grant_id: Option<String>,

    pub sell_date: NaiveDate,
    pub sell_price: Decimal,
    pub sell_cost: Option<Decimal>,
    pub sell_cost_currency: Option<Currency>,
    pub txn_id: Option<String>,

    pub valuation_daily: Option<DomesticValuation>,
    pub valuation_monthly: Option<DomesticValuation>,
}

impl SoldShareLot {
    pub fn from_lot(
        lot: ShareLot,
        sell_date: NaiveDate,
        sell_price: Decimal,
        sell_cost: Option<Decimal>,
        sell_cost_currency: Option<Currency>,
        txn_id: Option<String>,
    ) -> Self {
        Self {
            symbol: lot.symbol,
            quantity: lot.quantity,
            buy_date: lot.buy_date,
            buy_price: lot.buy_price,
            currency: lot.currency,
            source: lot.source,
            buy_cost: lot.buy_cost,
            buy_cost_currency: lot.buy_cost_currency,
            original_buy_price: lot.original_buy_price,
            cumulative_split_factor: lot.cumulative_split_factor,
            grant_id: lot.grant_id,
            sell_date,
            sell_price,
            sell_cost,
            sell_cost_currency,
            txn_id,
            valuation_daily: None,
            valuation_monthly: None,
        }
    }
}

/// Domestic-currency buy/sell/gain values for a sold cash lot (no per-unit
/// cost component: currency disposals carry no fees of their own beyond
/// what is already tracked as a separate [`MiscCashFlow`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashValuation {
    pub buy_price_dom: Decimal,
    pub sell_price_dom: Decimal,
    pub gain_dom: Decimal,
}

/// A [`CashLot`] augmented with sell data and domestic-currency valuations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoldCashLot {
    pub currency: Currency,
    pub quantity: Decimal,
    pub buy_date: NaiveDate,
    pub source: CashLotSource,
    pub tax_free: bool,

    pub sell_date: NaiveDate,

    pub valuation_daily: Option<CashValuation>,
    pub valuation_monthly: Option<CashValuation>,
}

impl SoldCashLot {
    pub fn from_lot(lot: CashLot, sell_date: NaiveDate) -> Self {
        Self {
            currency: lot.currency,
            quantity: lot.quantity,
            buy_date: lot.buy_date,
            source: lot.source,
            tax_free: lot.tax_free,
            sell_date,
            valuation_daily: None,
            valuation_monthly: None,
        }
    }
}

/// A withdrawn [`CashLot`] — not a taxable disposal, just removed from the
/// held queue and kept for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawnCashLot {
    pub currency: Currency,
    pub quantity: Decimal,
    pub buy_date: NaiveDate,
    pub source: CashLotSource,
    pub withdrawal_date: NaiveDate,
}

/// The category of a [`MiscCashFlow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MiscCategory {
    Dividend,
    Fee,
    WithholdingTax,
}

/// A single-instant foreign-currency amount tagged by category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiscCashFlow {
    pub category: MiscCategory,
    pub currency: Currency,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub comment: String,
    pub amount_dom_daily: Option<Decimal>,
    pub amount_dom_monthly: Option<Decimal>,
}

impl MiscCashFlow {
    pub fn new(
        category: MiscCategory,
        currency: Currency,
        date: NaiveDate,
        amount: Decimal,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            category,
            currency,
            date,
            amount,
            comment: comment.into(),
            amount_dom_daily: None,
            amount_dom_monthly: None,
        }
    }
}

/// Z4 purpose dictionary, closed per the reference deployment
/// (`pyfifotax/data_structures_awv.py`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwvZ4Purpose {
    RsuBonus,
    EsppBonus,
}

/// Z10 purpose dictionary, closed per the reference deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwvZ10Purpose {
    RsuDeposit,
    EsppDeposit,
    RsuTaxWithholding,
    Buy,
    Sale,
}

/// A reportable Z4 (bonus-style money transfer) entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwvZ4 {
    pub date: NaiveDate,
    pub symbol: String,
    pub currency: Currency,
    pub value: Decimal,
    pub value_dom: Option<Decimal>,
    pub is_incoming: bool,
    pub purpose: AwvZ4Purpose,
}

/// A reportable Z10 (securities transaction) entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwvZ10 {
    pub date: NaiveDate,
    pub symbol: String,
    pub currency: Currency,
    pub value: Decimal,
    pub value_dom: Option<Decimal>,
    pub is_incoming: bool,
    pub purpose: AwvZ10Purpose,
}
