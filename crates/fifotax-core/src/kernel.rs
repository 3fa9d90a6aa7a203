//! The processor kernel (component F): the central state machine that owns
//! every lot queue and mutates them event by event.
//!
//! Grounded on `pyfifotax/v2/src/core/fifo_processor.py` for dispatch order
//! and on `cgt_core::matcher::Matcher` for the Rust shape — a stateful
//! struct owning per-key maps plus append-only output vectors, driven by one
//! exhaustive `match` per event rather than per-class dispatch.

use crate::config::Config;
use crate::error::CoreError;
use crate::event::{Event, TaxAdjustment, normalize_events};
use crate::models::{
    AwvZ10, AwvZ10Purpose, AwvZ4, AwvZ4Purpose, CashLot, CashLotSource, MiscCashFlow,
    MiscCategory, ShareLot, ShareLotSource, SoldCashLot, SoldShareLot, WithdrawnCashLot,
};
use crate::queue::{CashQueue, DomesticCashBucket, ShareQueue};
use crate::valuation;
use crate::warning::Warning;
use fifotax_fx::FxRateProvider;
use fifotax_money::Currency;
use fifotax_price::PriceOracle;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Owns every share/cash queue and the append-only output lists; the single
/// mutable actor in the accounting model (§5: single-threaded, no shared
/// mutability outside this struct).
pub struct Kernel<'a> {
    config: &'a Config,
    shares: HashMap<String, ShareQueue>,
    cash: HashMap<Currency, CashQueue>,
    domestic_cash: DomesticCashBucket,

    pub sold_shares: HashMap<String, Vec<SoldShareLot>>,
    pub sold_cash: HashMap<Currency, Vec<SoldCashLot>>,
    pub withdrawn_cash: Vec<WithdrawnCashLot>,
    pub misc_dividend: Vec<MiscCashFlow>,
    pub misc_fee: Vec<MiscCashFlow>,
    pub misc_tax: Vec<MiscCashFlow>,
    pub awv_z4: Vec<AwvZ4>,
    pub awv_z10: Vec<AwvZ10>,
    pub warnings: Vec<Warning>,
}

impl<'a> Kernel<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            shares: HashMap::new(),
            cash: HashMap::new(),
            domestic_cash: DomesticCashBucket::default(),
            sold_shares: HashMap::new(),
            sold_cash: HashMap::new(),
            withdrawn_cash: Vec::new(),
            misc_dividend: Vec::new(),
            misc_fee: Vec::new(),
            misc_tax: Vec::new(),
            awv_z4: Vec::new(),
            awv_z10: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Clear every queue and output list. The domestic bucket is re-seeded
    /// at zero (§5) — its sentinel state is simply an empty total, there
    /// being no date on an aggregated bucket to stamp.
    pub fn reset(&mut self) {
        self.shares.clear();
        self.cash.clear();
        self.domestic_cash = DomesticCashBucket::default();
        self.sold_shares.clear();
        self.sold_cash.clear();
        self.withdrawn_cash.clear();
        self.misc_dividend.clear();
        self.misc_fee.clear();
        self.misc_tax.clear();
        self.awv_z4.clear();
        self.awv_z10.clear();
        self.warnings.clear();
    }

    /// Remaining per-symbol share lots and per-currency foreign cash lots,
    /// for a portfolio-overview screen downstream. Read-only: does not
    /// affect any accounting invariant.
    pub fn holdings_snapshot(&self) -> (HashMap<String, Vec<ShareLot>>, HashMap<Currency, Vec<CashLot>>, Decimal) {
        let shares = self
            .shares
            .iter()
            .map(|(symbol, queue)| (symbol.clone(), queue.lots().to_vec()))
            .collect();
        let cash = self
            .cash
            .iter()
            .map(|(currency, queue)| (*currency, queue.lots().to_vec()))
            .collect();
        (shares, cash, self.domestic_cash.total())
    }

    /// Normalise, sort by `(date, priority)` stably, then dispatch every
    /// event in order. Halts at the first queue error, wrapping it with the
    /// failing event's index and a debug rendering of the event itself.
    pub fn process(&mut self, events: Vec<Event>, oracle: &dyn PriceOracle) -> Result<(), CoreError> {
        let (mut normalized, norm_warnings) = normalize_events(events, oracle);
        self.warnings.extend(norm_warnings);

        let domestic = self.config.domestic_currency;
        normalized.sort_by(|a, b| (a.date(), a.priority(domestic)).cmp(&(b.date(), b.priority(domestic))));

        for (index, event) in normalized.into_iter().enumerate() {
            let description = format!("{event:?}");
            self.dispatch(event).map_err(|source| CoreError::EventFailed {
                index,
                event: description,
                source: Box::new(source),
            })?;
        }

        Ok(())
    }

    /// Every distinct currency this run ever touched: sold share/cash lots
    /// and misc cash flows (AWV entries reuse the same currencies, so they
    /// need no separate pass).
    fn currencies_in_use(&self) -> std::collections::HashSet<Currency> {
        let mut currencies = std::collections::HashSet::new();
        for lots in self.sold_shares.values() {
            for lot in lots {
                currencies.insert(lot.currency);
                if let Some(ccy) = lot.buy_cost_currency {
                    currencies.insert(ccy);
                }
                if let Some(ccy) = lot.sell_cost_currency {
                    currencies.insert(ccy);
                }
            }
        }
        for (currency, lots) in &self.sold_cash {
            if !lots.is_empty() {
                currencies.insert(*currency);
            }
        }
        for flows in [&self.misc_dividend, &self.misc_fee, &self.misc_tax] {
            for flow in flows {
                currencies.insert(flow.currency);
            }
        }
        currencies
    }

    /// Validate every currency this run touched against `provider`'s
    /// recognised set (§7: `UnsupportedCurrency` is fatal at event
    /// validation, ahead of any per-date rate lookup).
    fn validate_currencies(&self, provider: &dyn FxRateProvider) -> Result<(), CoreError> {
        let supported = provider.supported();
        for currency in self.currencies_in_use() {
            if currency != self.config.domestic_currency && !supported.contains(&currency) {
                return Err(CoreError::UnsupportedCurrency(currency));
            }
        }
        Ok(())
    }

    /// FX application (component G): attach daily and monthly
    /// domestic-currency valuations to every sold lot and misc cash flow.
    /// Run once after [`Kernel::process`] and before
    /// [`crate::report::consolidate`]/[`crate::awv`].
    pub fn apply_fx(&mut self, provider: &dyn FxRateProvider) -> Result<(), CoreError> {
        self.validate_currencies(provider)?;
        for lots in self.sold_shares.values_mut() {
            valuation::value_share_lots(lots, provider)?;
        }
        for lots in self.sold_cash.values_mut() {
            valuation::value_cash_lots(lots, provider)?;
        }
        valuation::value_misc_cash_flows(&mut self.misc_dividend, provider)?;
        valuation::value_misc_cash_flows(&mut self.misc_fee, provider)?;
        valuation::value_misc_cash_flows(&mut self.misc_tax, provider)?;
        valuation::value_awv_z4(&mut self.awv_z4, provider)?;
        valuation::value_awv_z10(&mut self.awv_z10, provider)?;
        Ok(())
    }

    fn shares_mut(&mut self, symbol: &str) -> &mut ShareQueue {
        self.shares
            .entry(symbol.to_string())
            .or_insert_with(|| ShareQueue::new(symbol))
    }

    fn push_cash(&mut self, currency: Currency, lot: CashLot) {
        if currency == self.config.domestic_currency {
            self.domestic_cash.push(lot.quantity);
        } else {
            self.cash.entry(currency).or_insert_with(|| CashQueue::new(currency)).push(lot);
        }
    }

    /// Pop `qty` units of `currency`, routing to the domestic bucket (which
    /// yields no lot records — I3) or the per-currency FIFO queue.
    fn pop_cash(&mut self, currency: Currency, qty: Decimal, date: chrono::NaiveDate) -> Result<Vec<CashLot>, CoreError> {
        if currency == self.config.domestic_currency {
            self.domestic_cash.pop(qty)?;
            return Ok(Vec::new());
        }
        let queue = self.cash.entry(currency).or_insert_with(|| CashQueue::new(currency));
        let (popped, warnings) = queue.pop(qty, date)?;
        self.warnings.extend(warnings);
        Ok(popped)
    }

    fn dispatch(&mut self, event: Event) -> Result<(), CoreError> {
        match event {
            Event::RsuVest {
                symbol,
                date,
                currency,
                historic_qty,
                historic_price,
                withheld_qty,
                grant_id,
                ..
            } => {
                let mut lot = ShareLot::new(&symbol, historic_qty, date, historic_price, currency, ShareLotSource::RsuVest);
                lot.grant_id = grant_id;
                self.shares_mut(&symbol).push(lot);

                let withheld = withheld_qty.unwrap_or(Decimal::ZERO);
                let total_value = (historic_qty + withheld) * historic_price;
                self.awv_z4.push(AwvZ4 {
                    date,
                    symbol: symbol.clone(),
                    currency,
                    value: total_value,
                    value_dom: None,
                    is_incoming: true,
                    purpose: AwvZ4Purpose::RsuBonus,
                });
                self.awv_z10.push(AwvZ10 {
                    date,
                    symbol: symbol.clone(),
                    currency,
                    value: total_value,
                    value_dom: None,
                    is_incoming: true,
                    purpose: AwvZ10Purpose::RsuDeposit,
                });
                if withheld > Decimal::ZERO {
                    self.awv_z10.push(AwvZ10 {
                        date,
                        symbol,
                        currency,
                        value: withheld * historic_price,
                        value_dom: None,
                        is_incoming: false,
                        purpose: AwvZ10Purpose::RsuTaxWithholding,
                    });
                }
                Ok(())
            }

            Event::EsppPurchase {
                symbol,
                date,
                currency,
                historic_qty,
                historic_purchase_price,
                historic_fair_market_value,
                ..
            } => {
                let lot = ShareLot::new(
                    &symbol,
                    historic_qty,
                    date,
                    historic_fair_market_value,
                    currency,
                    ShareLotSource::EsppPurchase,
                );
                self.shares_mut(&symbol).push(lot);

                let bonus = historic_qty * (historic_fair_market_value - historic_purchase_price);
                self.awv_z4.push(AwvZ4 {
                    date,
                    symbol: symbol.clone(),
                    currency,
                    value: bonus,
                    value_dom: None,
                    is_incoming: true,
                    purpose: AwvZ4Purpose::EsppBonus,
                });
                self.awv_z10.push(AwvZ10 {
                    date,
                    symbol,
                    currency,
                    value: historic_qty * historic_fair_market_value,
                    value_dom: None,
                    is_incoming: true,
                    purpose: AwvZ10Purpose::EsppDeposit,
                });
                Ok(())
            }

            Event::Dividend { symbol, date, currency, amount } => {
                self.push_cash(
                    currency,
                    CashLot::new(currency, amount, date, CashLotSource::Dividend { symbol: symbol.clone() }, true),
                );
                self.misc_dividend.push(MiscCashFlow::new(
                    MiscCategory::Dividend,
                    currency,
                    date,
                    amount,
                    format!("Dividend: {symbol}"),
                ));
                Ok(())
            }

            Event::Tax { symbol, date, currency, adjustment } => {
                match adjustment {
                    TaxAdjustment::Withheld { amount } => {
                        self.pop_cash(currency, amount, date)?;
                        self.misc_tax.push(MiscCashFlow::new(
                            MiscCategory::WithholdingTax,
                            currency,
                            date,
                            amount,
                            format!("Withholding tax: {symbol}"),
                        ));
                    }
                    TaxAdjustment::Reverted { amount } => {
                        self.push_cash(currency, CashLot::new(currency, amount, date, CashLotSource::TaxReverted, true));
                        self.misc_tax.push(MiscCashFlow::new(
                            MiscCategory::WithholdingTax,
                            currency,
                            date,
                            -amount,
                            format!("Reverted withholding tax: {symbol}"),
                        ));
                    }
                }
                Ok(())
            }

            Event::Buy {
                symbol,
                date,
                currency,
                historic_qty,
                historic_price,
                cost_of_shares,
                fees,
                ..
            } => {
                self.pop_cash(currency, cost_of_shares, date)?;

                let buy_cost = if let Some(fee) = fees.filter(|f| *f > Decimal::ZERO) {
                    self.pop_cash(currency, fee, date)?;
                    self.misc_fee.push(MiscCashFlow::new(MiscCategory::Fee, currency, date, fee, format!("Buy fee: {symbol}")));
                    Some(fee / historic_qty)
                } else {
                    None
                };

                let mut lot = ShareLot::new(&symbol, historic_qty, date, historic_price, currency, ShareLotSource::Buy);
                lot.buy_cost = buy_cost;
                lot.buy_cost_currency = buy_cost.map(|_| currency);
                self.shares_mut(&symbol).push(lot);

                self.awv_z10.push(AwvZ10 {
                    date,
                    symbol,
                    currency,
                    value: historic_qty * historic_price,
                    value_dom: None,
                    is_incoming: false,
                    purpose: AwvZ10Purpose::Buy,
                });
                Ok(())
            }

            Event::Sell {
                symbol,
                date,
                currency,
                historic_qty,
                historic_price,
                proceeds,
                fees,
                txn_id,
                ..
            } => {
                let (popped, warnings) = self.shares_mut(&symbol).pop(historic_qty, date)?;
                self.warnings.extend(warnings);

                let per_unit_fee = fees.filter(|f| *f > Decimal::ZERO).map(|fee| fee / historic_qty);
                let sold = popped.into_iter().map(|lot| {
                    SoldShareLot::from_lot(
                        lot,
                        date,
                        historic_price,
                        per_unit_fee,
                        per_unit_fee.map(|_| currency),
                        txn_id.clone(),
                    )
                });
                self.sold_shares.entry(symbol.clone()).or_default().extend(sold);

                self.push_cash(
                    currency,
                    CashLot::new(currency, proceeds, date, CashLotSource::SaleProceeds { symbol: symbol.clone() }, false),
                );

                if let Some(fee) = fees.filter(|f| *f > Decimal::ZERO) {
                    self.pop_cash(currency, fee, date)?;
                    self.misc_fee.push(MiscCashFlow::new(MiscCategory::Fee, currency, date, fee, format!("Sell fee: {symbol}")));
                }

                self.awv_z10.push(AwvZ10 {
                    date,
                    symbol,
                    currency,
                    value: historic_qty * historic_price,
                    value_dom: None,
                    is_incoming: true,
                    purpose: AwvZ10Purpose::Sale,
                });
                Ok(())
            }

            Event::MoneyDeposit { date, buy_date, currency, amount, fees } => {
                self.push_cash(currency, CashLot::new(currency, amount, buy_date, CashLotSource::Deposit, false));
                if let Some(fee) = fees.filter(|f| *f > Decimal::ZERO) {
                    self.pop_cash(currency, fee, date)?;
                    self.misc_fee.push(MiscCashFlow::new(MiscCategory::Fee, currency, date, fee, "Deposit fee"));
                }
                Ok(())
            }

            Event::MoneyWithdrawal { date, currency, amount, fees, .. } => {
                let popped = self.pop_cash(currency, amount, date)?;
                self.withdrawn_cash.extend(popped.into_iter().map(|lot| WithdrawnCashLot {
                    currency: lot.currency,
                    quantity: lot.quantity,
                    buy_date: lot.buy_date,
                    source: lot.source,
                    withdrawal_date: date,
                }));
                if let Some(fee) = fees.filter(|f| *f > Decimal::ZERO) {
                    self.pop_cash(currency, fee, date)?;
                    self.misc_fee.push(MiscCashFlow::new(MiscCategory::Fee, currency, date, fee, "Withdrawal fee"));
                }
                Ok(())
            }

            Event::CurrencyConversion { date, source_ccy, source_amount, target_ccy, target_amount, fees } => {
                let popped = self.pop_cash(source_ccy, source_amount, date)?;
                let sold = popped.into_iter().map(|lot| SoldCashLot::from_lot(lot, date));
                self.sold_cash.entry(source_ccy).or_default().extend(sold);

                if target_amount >= Decimal::ZERO {
                    self.push_cash(
                        target_ccy,
                        CashLot::new(target_ccy, target_amount, date, CashLotSource::CurrencyConversion { from: source_ccy, to: target_ccy }, false),
                    );
                }

                if let Some(fee) = fees.filter(|f| *f > Decimal::ZERO) {
                    self.pop_cash(source_ccy, fee, date)?;
                    self.misc_fee.push(MiscCashFlow::new(MiscCategory::Fee, source_ccy, date, fee, "Conversion fee"));
                }
                Ok(())
            }

            Event::StockSplit { symbol, ratio, .. } => {
                if self.config.apply_stock_splits {
                    self.shares_mut(&symbol).apply_split(ratio);
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fifotax_price::StaticPriceOracle;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rsu_vest_then_partial_sell_scenario_1() {
        let config = Config::embedded();
        let mut kernel = Kernel::new(&config);
        let oracle = StaticPriceOracle::new();

        let events = vec![
            Event::rsu_vest("NVDA", date(2022, 3, 15), Currency::USD, dec!(10), dec!(250), Some(dec!(5)), None),
            Event::sell("NVDA", date(2022, 11, 10), Currency::USD, dec!(4), dec!(300), dec!(1200), None, None),
        ];
        kernel.process(events, &oracle).unwrap();

        let sold = &kernel.sold_shares["NVDA"];
        assert_eq!(sold.len(), 1);
        assert_eq!(sold[0].quantity, dec!(4));
        assert_eq!(sold[0].buy_date, date(2022, 3, 15));
        assert_eq!(sold[0].buy_price, dec!(250));
        assert_eq!(sold[0].sell_price, dec!(300));

        let remaining = kernel.shares_mut("NVDA");
        assert_eq!(remaining.total_quantity(), dec!(6));
        assert_eq!(remaining.peek().unwrap().buy_price, dec!(250));

        assert_eq!(kernel.awv_z4.len(), 1);
        assert_eq!(kernel.awv_z4[0].value, dec!(3750));
        let deposit = kernel.awv_z10.iter().find(|e| e.purpose == AwvZ10Purpose::RsuDeposit).unwrap();
        assert_eq!(deposit.value, dec!(3750));
        let withholding = kernel.awv_z10.iter().find(|e| e.purpose == AwvZ10Purpose::RsuTaxWithholding).unwrap();
        assert_eq!(withholding.value, dec!(1250));
        let sale = kernel.awv_z10.iter().find(|e| e.purpose == AwvZ10Purpose::Sale).unwrap();
        assert_eq!(sale.value, dec!(1200));
    }

    #[test]
    fn stock_split_between_buy_and_sell_scenario_3() {
        let config = Config::embedded();
        let mut kernel = Kernel::new(&config);
        let oracle = StaticPriceOracle::new();

        let events = vec![
            Event::buy("AAPL", date(2023, 1, 10), Currency::USD, dec!(10), dec!(400), dec!(4000), None, None),
            Event::StockSplit { symbol: "AAPL".to_string(), date: date(2023, 7, 1), ratio: dec!(2) },
            Event::sell("AAPL", date(2023, 9, 1), Currency::USD, dec!(20), dec!(220), dec!(4400), None, None),
        ];
        kernel.process(events, &oracle).unwrap();

        let sold = &kernel.sold_shares["AAPL"][0];
        assert_eq!(sold.quantity, dec!(20));
        assert_eq!(sold.buy_price, dec!(200));
        assert_eq!(sold.sell_price, dec!(220));
        let gain = sold.quantity * (sold.sell_price - sold.buy_price);
        assert_eq!(gain, dec!(400));
    }

    #[test]
    fn same_day_sell_then_buy_scenario_4() {
        let config = Config::embedded();
        let mut kernel = Kernel::new(&config);
        let oracle = StaticPriceOracle::new();
        let d = date(2024, 2, 1);

        // No USD cash exists before `d`; the sell's proceeds must land before
        // the buy's cost pop is attempted, which only happens if priority
        // ordering (sell = 5, buy = 7) is honoured regardless of input order.
        let events = vec![
            Event::buy("MSFT", d, Currency::USD, dec!(10), dec!(400), dec!(4000), None, None),
            Event::sell("NVDA", d, Currency::USD, dec!(5), dec!(1000), dec!(5000), None, None),
        ];
        kernel.shares_mut("NVDA").push(ShareLot::new("NVDA", dec!(5), date(2023, 1, 1), dec!(10), Currency::USD, ShareLotSource::Buy));

        kernel.process(events, &oracle).unwrap();

        let usd = kernel.cash.get(&Currency::USD).unwrap();
        assert_eq!(usd.total_quantity(), dec!(1000));
    }

    #[test]
    fn reverted_tax_withholding_scenario_5() {
        let config = Config::embedded();
        let mut kernel = Kernel::new(&config);
        let oracle = StaticPriceOracle::new();

        let events = vec![
            Event::Dividend { symbol: "X".to_string(), date: date(2023, 4, 1), currency: Currency::USD, amount: dec!(100) },
            Event::Tax {
                symbol: "X".to_string(),
                date: date(2023, 4, 1),
                currency: Currency::USD,
                adjustment: TaxAdjustment::Withheld { amount: dec!(15) },
            },
            Event::Tax {
                symbol: "X".to_string(),
                date: date(2023, 5, 1),
                currency: Currency::USD,
                adjustment: TaxAdjustment::Reverted { amount: dec!(15) },
            },
        ];
        kernel.process(events, &oracle).unwrap();

        let net: Decimal = kernel.misc_tax.iter().map(|m| m.amount).sum();
        assert_eq!(net, Decimal::ZERO);
        assert_eq!(kernel.misc_tax.len(), 2);
        assert_eq!(kernel.misc_tax[0].amount, dec!(15));
        assert_eq!(kernel.misc_tax[1].amount, dec!(-15));

        let usd = kernel.cash.get(&Currency::USD).unwrap();
        assert_eq!(usd.total_quantity(), dec!(100));
    }

    #[test]
    fn currency_conversion_sentinel_creates_sold_cash_with_no_target_lot() {
        let config = Config::embedded();
        let mut kernel = Kernel::new(&config);
        let oracle = StaticPriceOracle::new();

        let events = vec![
            Event::MoneyDeposit { date: date(2021, 6, 1), buy_date: date(2021, 6, 1), currency: Currency::USD, amount: dec!(10000), fees: None },
            Event::CurrencyConversion {
                date: date(2022, 6, 1),
                source_ccy: Currency::USD,
                source_amount: dec!(10000),
                target_ccy: Currency::EUR,
                target_amount: dec!(-1),
                fees: None,
            },
        ];
        kernel.process(events, &oracle).unwrap();

        let sold = &kernel.sold_cash[&Currency::USD];
        assert_eq!(sold.len(), 1);
        assert_eq!(sold[0].quantity, dec!(10000));
        assert_eq!(sold[0].buy_date, date(2021, 6, 1));
        assert_eq!(sold[0].sell_date, date(2022, 6, 1));
        assert_eq!(kernel.domestic_cash.total(), Decimal::ZERO);
    }

    #[test]
    fn apply_fx_rejects_currency_the_provider_does_not_recognise() {
        use fifotax_fx::FxCache;

        let config = Config::embedded();
        let mut kernel = Kernel::new(&config);
        let oracle = StaticPriceOracle::new();

        let events = vec![Event::sell(
            "NVDA",
            date(2023, 1, 1),
            Currency::USD,
            dec!(1),
            dec!(10),
            dec!(10),
            None,
            None,
        )];
        kernel.shares_mut("NVDA").push(ShareLot::new("NVDA", dec!(1), date(2022, 1, 1), dec!(5), Currency::USD, ShareLotSource::Buy));
        kernel.process(events, &oracle).unwrap();

        // A provider whose domestic is EUR but that never learned about USD.
        let provider = FxCache::new(Currency::EUR);
        assert!(matches!(kernel.apply_fx(&provider), Err(CoreError::UnsupportedCurrency(Currency::USD))));
    }
}
