//! Report consolidator (component H): filters a processed, FX-valued run
//! down to a single calendar year and aggregates it into the fixed
//! line-items of the tax-summary table.
//!
//! Grounded structurally on `cgt_core::calculator::calculate` — filter
//! matches into a year, group into line-items, sort deterministically —
//! generalised from the teacher's UK same-day/B&B/Section-104 tax-status
//! model to this spec's speculative-period/tax-free-origin model (§4.H).

use crate::config::{Config, RateMode};
use crate::kernel::Kernel;
use crate::models::{DomesticValuation, MiscCashFlow, SoldCashLot, SoldShareLot};
use chrono::{Datelike, NaiveDate};
use fifotax_money::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Why a sold cash lot's gain is (or is not) excluded from the tax tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashTaxStatus {
    /// Held at least `speculative_period_days` (default 365) before sale.
    TaxFreeHolding,
    /// Originates from a dividend or bonus component (`CashLot::tax_free`).
    TaxFreeOrigin,
    Taxable,
}

/// One row of the `shares` report table: a sold share lot valued in the
/// selected rate mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareRow {
    pub symbol: String,
    pub quantity: Decimal,
    pub buy_date: NaiveDate,
    pub buy_price: Decimal,
    pub sell_date: NaiveDate,
    pub sell_price: Decimal,
    pub currency: Currency,
    pub buy_price_dom: Decimal,
    pub sell_price_dom: Decimal,
    pub cost_dom: Decimal,
    pub gain_dom: Decimal,
}

/// One row of the `forex` report table: a sold currency lot, tagged with its
/// tax status. Tax-free rows carry zeroed `buy/sell_price_dom`/`gain_dom`
/// (spec.md §4.H step 2) with the informational values preserved in
/// `comment`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForexRow {
    pub currency: Currency,
    pub quantity: Decimal,
    pub buy_date: NaiveDate,
    pub sell_date: NaiveDate,
    pub tax_status: CashTaxStatus,
    pub buy_price_dom: Decimal,
    pub sell_price_dom: Decimal,
    pub gain_dom: Decimal,
    pub comment: String,
}

/// The fixed, aggregated line-items of spec.md §4.H step 4.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Summary {
    pub share_gains: Decimal,
    pub share_losses: Decimal,
    pub forex_gain_total: Decimal,
    pub forex_buy_value_total: Decimal,
    pub forex_sell_value_total: Decimal,
    pub total_dividends: Decimal,
    pub total_fees: Decimal,
    pub total_taxes: Decimal,
    pub total_foreign_capital_income: Decimal,
}

/// The consolidated report for a single calendar year and rate mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxReport {
    pub year: i32,
    pub rate_mode: RateMode,
    pub shares: Vec<ShareRow>,
    pub forex: Vec<ForexRow>,
    pub dividends: Vec<MiscCashFlow>,
    pub fees: Vec<MiscCashFlow>,
    pub taxes: Vec<MiscCashFlow>,
    pub summary: Summary,
}

fn selected_share_valuation(lot: &SoldShareLot, mode: RateMode) -> DomesticValuation {
    match mode {
        RateMode::Daily => lot.valuation_daily,
        RateMode::Monthly => lot.valuation_monthly,
    }
    .unwrap_or(DomesticValuation {
        buy_price_dom: Decimal::ZERO,
        sell_price_dom: Decimal::ZERO,
        cost_dom: Decimal::ZERO,
        gain_dom: Decimal::ZERO,
    })
}

fn selected_cash_valuation(lot: &SoldCashLot, mode: RateMode) -> (Decimal, Decimal, Decimal) {
    let v = match mode {
        RateMode::Daily => lot.valuation_daily,
        RateMode::Monthly => lot.valuation_monthly,
    };
    v.map(|v| (v.buy_price_dom, v.sell_price_dom, v.gain_dom))
        .unwrap_or((Decimal::ZERO, Decimal::ZERO, Decimal::ZERO))
}

fn selected_amount_dom(flow: &MiscCashFlow, mode: RateMode) -> Decimal {
    match mode {
        RateMode::Daily => flow.amount_dom_daily,
        RateMode::Monthly => flow.amount_dom_monthly,
    }
    .unwrap_or(Decimal::ZERO)
}

fn classify(lot: &SoldCashLot, config: &Config) -> CashTaxStatus {
    let holding_days = (lot.sell_date - lot.buy_date).num_days();
    if holding_days >= config.speculative_period_days {
        CashTaxStatus::TaxFreeHolding
    } else if config.consider_tax_free_forex && lot.tax_free {
        CashTaxStatus::TaxFreeOrigin
    } else {
        CashTaxStatus::Taxable
    }
}

fn share_rows(kernel: &Kernel, year: i32, mode: RateMode) -> Vec<ShareRow> {
    let mut rows: Vec<ShareRow> = kernel
        .sold_shares
        .values()
        .flatten()
        .filter(|lot| lot.sell_date.year() == year)
        .map(|lot| {
            let v = selected_share_valuation(lot, mode);
            ShareRow {
                symbol: lot.symbol.clone(),
                quantity: lot.quantity,
                buy_date: lot.buy_date,
                buy_price: lot.buy_price,
                sell_date: lot.sell_date,
                sell_price: lot.sell_price,
                currency: lot.currency,
                buy_price_dom: v.buy_price_dom,
                sell_price_dom: v.sell_price_dom,
                cost_dom: v.cost_dom,
                gain_dom: v.gain_dom,
            }
        })
        .collect();
    rows.sort_by(|a, b| (a.sell_date, a.buy_date, a.symbol.clone()).cmp(&(b.sell_date, b.buy_date, b.symbol.clone())));
    rows
}

fn forex_rows(kernel: &Kernel, year: i32, mode: RateMode, config: &Config) -> Vec<ForexRow> {
    let mut rows: Vec<ForexRow> = kernel
        .sold_cash
        .iter()
        .filter(|(currency, _)| **currency != config.domestic_currency)
        .flat_map(|(_, lots)| lots.iter())
        .filter(|lot| lot.sell_date.year() == year)
        .map(|lot| {
            let (buy_dom, sell_dom, gain_dom) = selected_cash_valuation(lot, mode);
            let status = classify(lot, config);
            let taxable = status == CashTaxStatus::Taxable;
            let comment = if taxable {
                String::new()
            } else {
                format!(
                    "informational (tax-free: {status:?}): buy={buy_dom} sell={sell_dom} gain={gain_dom}"
                )
            };
            ForexRow {
                currency: lot.currency,
                quantity: lot.quantity,
                buy_date: lot.buy_date,
                sell_date: lot.sell_date,
                tax_status: status,
                buy_price_dom: if taxable { buy_dom } else { Decimal::ZERO },
                sell_price_dom: if taxable { sell_dom } else { Decimal::ZERO },
                gain_dom: if taxable { gain_dom } else { Decimal::ZERO },
                comment,
            }
        })
        .collect();
    rows.sort_by_key(|r| (r.sell_date, r.buy_date, r.currency.code()));
    rows
}

fn misc_rows(flows: &[MiscCashFlow], year: i32, _mode: RateMode) -> Vec<MiscCashFlow> {
    let mut rows: Vec<MiscCashFlow> = flows.iter().filter(|flow| flow.date.year() == year).cloned().collect();
    rows.sort_by_key(|flow| flow.date);
    rows
}

/// Filter by `year`/`mode`, tag cash lots, and aggregate into the fixed
/// line-items (spec.md §4.H). The kernel's outputs must already carry FX
/// valuations (see [`crate::valuation`]) before calling this.
pub fn consolidate(kernel: &Kernel, config: &Config, year: i32, mode: RateMode) -> TaxReport {
    let shares = share_rows(kernel, year, mode);
    let forex = forex_rows(kernel, year, mode, config);
    let dividends = misc_rows(&kernel.misc_dividend, year, mode);
    let fees = misc_rows(&kernel.misc_fee, year, mode);
    let taxes = misc_rows(&kernel.misc_tax, year, mode);

    let share_gains: Decimal = shares.iter().map(|r| r.gain_dom).filter(|g| *g > Decimal::ZERO).sum();
    let share_losses: Decimal = shares.iter().map(|r| r.gain_dom).filter(|g| *g < Decimal::ZERO).sum();
    let forex_gain_total: Decimal = forex.iter().map(|r| r.gain_dom).sum();
    let forex_buy_value_total: Decimal = forex.iter().map(|r| r.quantity * r.buy_price_dom).sum();
    let forex_sell_value_total: Decimal = forex.iter().map(|r| r.quantity * r.sell_price_dom).sum();
    let total_dividends: Decimal = dividends.iter().map(|f| selected_amount_dom(f, mode)).sum();
    let total_fees: Decimal = fees.iter().map(|f| selected_amount_dom(f, mode)).sum();
    let total_taxes: Decimal = taxes.iter().map(|f| selected_amount_dom(f, mode)).sum();

    let summary = Summary {
        share_gains,
        share_losses,
        forex_gain_total,
        forex_buy_value_total,
        forex_sell_value_total,
        total_dividends,
        total_fees,
        total_taxes,
        total_foreign_capital_income: share_gains + share_losses + total_dividends,
    };

    TaxReport {
        year,
        rate_mode: mode,
        shares,
        forex,
        dividends,
        fees,
        taxes,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CashLotSource, MiscCategory};
    use fifotax_price::StaticPriceOracle;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn valued_cash_lot(buy: NaiveDate, sell: NaiveDate, tax_free: bool, gain: Decimal) -> SoldCashLot {
        SoldCashLot {
            currency: Currency::USD,
            quantity: dec!(1000),
            buy_date: buy,
            source: CashLotSource::Deposit,
            tax_free,
            sell_date: sell,
            valuation_daily: Some(crate::models::CashValuation {
                buy_price_dom: dec!(1),
                sell_price_dom: dec!(1) + gain / dec!(1000),
                gain_dom: gain,
            }),
            valuation_monthly: None,
        }
    }

    #[test]
    fn speculative_period_boundary_scenario_2() {
        let config = Config::embedded();
        let mut kernel = Kernel::new(&config);
        let oracle = StaticPriceOracle::new();
        kernel.process(Vec::new(), &oracle).unwrap();

        kernel
            .sold_cash
            .entry(Currency::USD)
            .or_default()
            .push(valued_cash_lot(date(2021, 6, 1), date(2022, 6, 1), false, dec!(500)));

        let report = consolidate(&kernel, &config, 2022, RateMode::Daily);
        assert_eq!(report.forex.len(), 1);
        assert_eq!(report.forex[0].tax_status, CashTaxStatus::TaxFreeHolding);
        assert_eq!(report.forex[0].gain_dom, Decimal::ZERO);
        assert_eq!(report.summary.forex_gain_total, Decimal::ZERO);
    }

    #[test]
    fn one_day_short_of_speculative_period_is_taxable() {
        let config = Config::embedded();
        let mut kernel = Kernel::new(&config);
        let oracle = StaticPriceOracle::new();
        kernel.process(Vec::new(), &oracle).unwrap();

        kernel
            .sold_cash
            .entry(Currency::USD)
            .or_default()
            .push(valued_cash_lot(date(2021, 6, 1), date(2022, 5, 31), false, dec!(500)));

        let report = consolidate(&kernel, &config, 2022, RateMode::Daily);
        assert_eq!(report.forex[0].tax_status, CashTaxStatus::Taxable);
        assert_eq!(report.forex[0].gain_dom, dec!(500));
        assert_eq!(report.summary.forex_gain_total, dec!(500));
    }

    #[test]
    fn domestic_currency_cash_lots_excluded_from_forex_table() {
        let config = Config::embedded();
        let mut kernel = Kernel::new(&config);
        let oracle = StaticPriceOracle::new();
        kernel.process(Vec::new(), &oracle).unwrap();

        kernel
            .sold_cash
            .entry(Currency::EUR)
            .or_default()
            .push(valued_cash_lot(date(2022, 1, 1), date(2022, 2, 1), false, dec!(0)));

        let report = consolidate(&kernel, &config, 2022, RateMode::Daily);
        assert!(report.forex.is_empty());
    }

    #[test]
    fn tax_free_origin_zeroes_out_dividend_cash_sale() {
        let config = Config::embedded();
        let mut kernel = Kernel::new(&config);
        let oracle = StaticPriceOracle::new();
        kernel.process(Vec::new(), &oracle).unwrap();

        kernel
            .sold_cash
            .entry(Currency::USD)
            .or_default()
            .push(valued_cash_lot(date(2022, 1, 1), date(2022, 2, 1), true, dec!(100)));

        let report = consolidate(&kernel, &config, 2022, RateMode::Daily);
        assert_eq!(report.forex[0].tax_status, CashTaxStatus::TaxFreeOrigin);
        assert_eq!(report.forex[0].gain_dom, Decimal::ZERO);
    }

    #[test]
    fn total_foreign_capital_income_aggregates_shares_and_dividends() {
        let config = Config::embedded();
        let mut kernel = Kernel::new(&config);
        let oracle = StaticPriceOracle::new();
        kernel.process(Vec::new(), &oracle).unwrap();

        let mut dividend = MiscCashFlow::new(MiscCategory::Dividend, Currency::USD, date(2022, 3, 1), dec!(100), "Dividend: X");
        dividend.amount_dom_daily = Some(dec!(90));
        kernel.misc_dividend.push(dividend);

        let report = consolidate(&kernel, &config, 2022, RateMode::Daily);
        assert_eq!(report.summary.total_dividends, dec!(90));
        assert_eq!(report.summary.total_foreign_capital_income, dec!(90));
    }
}
