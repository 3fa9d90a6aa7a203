//! FX application (component G): attaches domestic-currency valuations to
//! every sold lot and misc cash flow after event processing and before
//! consolidation.
//!
//! Both the daily and the monthly rate mode are computed and stored side by
//! side on every record (spec.md §4.G): the report mode only selects which
//! one to read at presentation time, so a caller can switch modes without
//! re-running the kernel.

use crate::error::CoreError;
use crate::models::{AwvZ10, AwvZ4, CashValuation, DomesticValuation, MiscCashFlow, SoldCashLot, SoldShareLot};
use chrono::NaiveDate;
use fifotax_fx::FxRateProvider;
use rust_decimal::Decimal;

/// Domestic-currency units per one unit of `currency` on `date`, in the
/// requested `mode`.
fn rate(provider: &dyn FxRateProvider, currency: fifotax_money::Currency, date: NaiveDate) -> Result<Decimal, CoreError> {
    provider.daily_rate(currency, date).map_err(CoreError::from)
}

fn monthly_rate(provider: &dyn FxRateProvider, currency: fifotax_money::Currency, date: NaiveDate) -> Result<Decimal, CoreError> {
    use chrono::Datelike;
    provider
        .monthly_rate(currency, date.year(), date.month())
        .map_err(CoreError::from)
}

fn share_valuation(
    lot: &SoldShareLot,
    provider: &dyn FxRateProvider,
    rate_fn: impl Fn(&dyn FxRateProvider, fifotax_money::Currency, NaiveDate) -> Result<Decimal, CoreError>,
) -> Result<DomesticValuation, CoreError> {
    let buy_rate = rate_fn(provider, lot.currency, lot.buy_date)?;
    let sell_rate = rate_fn(provider, lot.currency, lot.sell_date)?;
    let buy_price_dom = lot.buy_price / buy_rate;
    let sell_price_dom = lot.sell_price / sell_rate;

    let buy_cost_dom = match (lot.buy_cost, lot.buy_cost_currency) {
        (Some(cost), Some(ccy)) => cost / rate_fn(provider, ccy, lot.buy_date)?,
        _ => Decimal::ZERO,
    };
    let sell_cost_dom = match (lot.sell_cost, lot.sell_cost_currency) {
        (Some(cost), Some(ccy)) => cost / rate_fn(provider, ccy, lot.sell_date)?,
        _ => Decimal::ZERO,
    };
    let cost_dom = lot.quantity * (buy_cost_dom + sell_cost_dom);
    let gain_dom = lot.quantity * (sell_price_dom - buy_price_dom) - cost_dom;

    Ok(DomesticValuation {
        buy_price_dom,
        sell_price_dom,
        cost_dom,
        gain_dom,
    })
}

fn cash_valuation(
    lot: &SoldCashLot,
    provider: &dyn FxRateProvider,
    rate_fn: impl Fn(&dyn FxRateProvider, fifotax_money::Currency, NaiveDate) -> Result<Decimal, CoreError>,
) -> Result<CashValuation, CoreError> {
    let buy_rate = rate_fn(provider, lot.currency, lot.buy_date)?;
    let sell_rate = rate_fn(provider, lot.currency, lot.sell_date)?;
    let buy_price_dom = Decimal::ONE / buy_rate;
    let sell_price_dom = Decimal::ONE / sell_rate;
    let gain_dom = lot.quantity * (sell_price_dom - buy_price_dom);

    Ok(CashValuation {
        buy_price_dom,
        sell_price_dom,
        gain_dom,
    })
}

/// Attach `valuation_daily`/`valuation_monthly` to every sold share lot.
pub fn value_share_lots(lots: &mut [SoldShareLot], provider: &dyn FxRateProvider) -> Result<(), CoreError> {
    for lot in lots.iter_mut() {
        lot.valuation_daily = Some(share_valuation(lot, provider, rate)?);
        lot.valuation_monthly = Some(share_valuation(lot, provider, monthly_rate)?);
    }
    Ok(())
}

/// Attach `valuation_daily`/`valuation_monthly` to every sold cash lot.
pub fn value_cash_lots(lots: &mut [SoldCashLot], provider: &dyn FxRateProvider) -> Result<(), CoreError> {
    for lot in lots.iter_mut() {
        lot.valuation_daily = Some(cash_valuation(lot, provider, rate)?);
        lot.valuation_monthly = Some(cash_valuation(lot, provider, monthly_rate)?);
    }
    Ok(())
}

/// Attach `amount_dom_daily`/`amount_dom_monthly` to every misc cash flow.
pub fn value_misc_cash_flows(flows: &mut [MiscCashFlow], provider: &dyn FxRateProvider) -> Result<(), CoreError> {
    for flow in flows.iter_mut() {
        flow.amount_dom_daily = Some(flow.amount / rate(provider, flow.currency, flow.date)?);
        flow.amount_dom_monthly = Some(flow.amount / monthly_rate(provider, flow.currency, flow.date)?);
    }
    Ok(())
}

/// Attach `value_dom` (always at the daily rate — AWV reporting thresholds
/// are a same-day euro-equivalent test, not a monthly-average one) to every
/// Z4 entry.
pub fn value_awv_z4(entries: &mut [AwvZ4], provider: &dyn FxRateProvider) -> Result<(), CoreError> {
    for entry in entries.iter_mut() {
        entry.value_dom = Some(entry.value / rate(provider, entry.currency, entry.date)?);
    }
    Ok(())
}

/// Attach `value_dom` to every Z10 entry. See [`value_awv_z4`].
pub fn value_awv_z10(entries: &mut [AwvZ10], provider: &dyn FxRateProvider) -> Result<(), CoreError> {
    for entry in entries.iter_mut() {
        entry.value_dom = Some(entry.value / rate(provider, entry.currency, entry.date)?);
    }
    Ok(())
}
