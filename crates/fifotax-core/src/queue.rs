//! FIFO lot queues: one per `(kind, key)` where `kind` is Share or Cash, plus
//! a single aggregating domestic-cash bucket.
//!
//! Grounded directly on `pyfifotax/data_structures_fifo.py::FIFOQueue`,
//! which backs both the share queues (`FIFOShare`) and the foreign-cash
//! queues (`FIFOForex`) with one generic class. We carry that generality as
//! a private `pop_lots` helper shared by [`ShareQueue`] and [`CashQueue`],
//! restructured per the teacher's preference for tagged concrete types over
//! one dynamically-typed queue.

use crate::error::CoreError;
use crate::models::{CashLot, ShareLot};
use crate::warning::Warning;
use chrono::NaiveDate;
use fifotax_money::{Currency, DUST_THRESHOLD, is_approximately_zero, is_dust};
use rust_decimal::Decimal;

/// One calendar-day tolerance for cash-queue overdraw, absorbing
/// broker-rounding noise in aggregate cash positions.
const CASH_OVERDRAW_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 0);

trait Lot: Clone {
    fn quantity(&self) -> Decimal;
    fn set_quantity(&mut self, quantity: Decimal);
    fn buy_date(&self) -> NaiveDate;
}

impl Lot for ShareLot {
    fn quantity(&self) -> Decimal {
        self.quantity
    }
    fn set_quantity(&mut self, quantity: Decimal) {
        self.quantity = quantity;
    }
    fn buy_date(&self) -> NaiveDate {
        self.buy_date
    }
}

impl Lot for CashLot {
    fn quantity(&self) -> Decimal {
        self.quantity
    }
    fn set_quantity(&mut self, quantity: Decimal) {
        self.quantity = quantity;
    }
    fn buy_date(&self) -> NaiveDate {
        self.buy_date
    }
}

fn push_lot<T: Lot>(lots: &mut Vec<T>, total: &mut Decimal, lot: T) {
    let date = lot.buy_date();
    let index = lots
        .iter()
        .position(|existing| existing.buy_date() > date)
        .unwrap_or(lots.len());
    *total += lot.quantity();
    lots.insert(index, lot);
}

/// Remove exactly `qty` units from the front of `lots`, spanning as many
/// lots as needed. `allow_clamp` permits the cash-queue broker-rounding
/// tolerance (silently clamp an overdraw of less than one unit instead of
/// failing). Returns the consumed (possibly split) lot chunks plus any
/// warnings raised along the way.
fn pop_lots<T: Lot>(
    lots: &mut Vec<T>,
    total: &mut Decimal,
    qty: Decimal,
    sell_date: NaiveDate,
    kind: &'static str,
    key: &str,
    clamp_currency: Option<Currency>,
) -> Result<(Vec<T>, Vec<Warning>), CoreError> {
    let allow_clamp = clamp_currency.is_some();
    if is_approximately_zero(qty) {
        return Ok((Vec::new(), Vec::new()));
    }
    if qty < Decimal::ZERO {
        return Err(CoreError::NegativeQuantity {
            kind,
            key: key.to_string(),
            quantity: qty,
        });
    }
    if lots.is_empty() {
        return Err(CoreError::EmptyQueue {
            kind,
            key: key.to_string(),
            requested: qty,
        });
    }

    let mut warnings = Vec::new();
    let mut remaining = qty;
    if remaining > *total {
        let shortfall = remaining - *total;
        if allow_clamp && shortfall <= CASH_OVERDRAW_TOLERANCE {
            if let Some(currency) = clamp_currency {
                warnings.push(Warning::CashOverdrawClamped { currency, shortfall });
            }
            remaining = *total;
        } else {
            return Err(CoreError::Overdraw {
                kind,
                key: key.to_string(),
                requested: qty,
                available: *total,
            });
        }
    }

    let mut popped = Vec::new();
    while !is_approximately_zero(remaining) {
        let Some(head) = lots.first() else {
            break;
        };
        if head.buy_date() > sell_date {
            return Err(CoreError::NotYetAcquired {
                kind,
                key: key.to_string(),
                buy_date: head.buy_date(),
                sell_date,
            });
        }

        let head_qty = lots[0].quantity();
        if head_qty <= remaining || is_approximately_zero(head_qty - remaining) {
            let mut lot = lots.remove(0);
            lot.set_quantity(head_qty);
            remaining -= head_qty;
            popped.push(lot);
        } else {
            let mut chunk = lots[0].clone();
            chunk.set_quantity(remaining);
            lots[0].set_quantity(head_qty - remaining);
            popped.push(chunk);
            remaining = Decimal::ZERO;
        }
    }

    *total = lots.iter().map(Lot::quantity).sum();
    if is_dust(*total) && !lots.is_empty() {
        lots.clear();
        *total = Decimal::ZERO;
        warnings.push(Warning::DustCleared {
            kind,
            key: key.to_string(),
        });
    }

    Ok((popped, warnings))
}

/// A FIFO queue of [`ShareLot`]s for a single ticker symbol.
#[derive(Debug, Clone)]
pub struct ShareQueue {
    symbol: String,
    lots: Vec<ShareLot>,
    total: Decimal,
}

impl ShareQueue {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            lots: Vec::new(),
            total: Decimal::ZERO,
        }
    }

    pub fn push(&mut self, lot: ShareLot) {
        push_lot(&mut self.lots, &mut self.total, lot);
    }

    pub fn pop(
        &mut self,
        qty: Decimal,
        sell_date: NaiveDate,
    ) -> Result<(Vec<ShareLot>, Vec<Warning>), CoreError> {
        pop_lots(
            &mut self.lots,
            &mut self.total,
            qty,
            sell_date,
            "share",
            &self.symbol,
            None,
        )
    }

    /// Multiply every lot's quantity by `ratio` and divide its buy price by
    /// `ratio`, recording the cumulative factor and the pre-split price on
    /// first application. Order is unchanged.
    pub fn apply_split(&mut self, ratio: Decimal) {
        for lot in &mut self.lots {
            if lot.original_buy_price.is_none() {
                lot.original_buy_price = Some(lot.buy_price);
            }
            lot.quantity *= ratio;
            lot.buy_price /= ratio;
            lot.cumulative_split_factor *= ratio;
        }
        self.total *= ratio;
    }

    pub fn peek(&self) -> Option<&ShareLot> {
        self.lots.first()
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    pub fn total_quantity(&self) -> Decimal {
        self.total
    }

    pub fn lots(&self) -> &[ShareLot] {
        &self.lots
    }
}

/// A FIFO queue of [`CashLot`]s for a single foreign currency.
#[derive(Debug, Clone)]
pub struct CashQueue {
    currency: Currency,
    lots: Vec<CashLot>,
    total: Decimal,
}

impl CashQueue {
    pub fn new(currency: Currency) -> Self {
        Self {
            currency,
            lots: Vec::new(),
            total: Decimal::ZERO,
        }
    }

    pub fn push(&mut self, lot: CashLot) {
        push_lot(&mut self.lots, &mut self.total, lot);
    }

    pub fn pop(
        &mut self,
        qty: Decimal,
        sell_date: NaiveDate,
    ) -> Result<(Vec<CashLot>, Vec<Warning>), CoreError> {
        pop_lots(
            &mut self.lots,
            &mut self.total,
            qty,
            sell_date,
            "cash",
            self.currency.code(),
            Some(self.currency),
        )
    }

    pub fn peek(&self) -> Option<&CashLot> {
        self.lots.first()
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    pub fn total_quantity(&self) -> Decimal {
        self.total
    }

    pub fn lots(&self) -> &[CashLot] {
        &self.lots
    }
}

/// The domestic-currency cash position: a single aggregating bucket rather
/// than a date-ordered FIFO list, per invariant I3. Splits never apply.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomesticCashBucket {
    total: Decimal,
}

impl DomesticCashBucket {
    pub fn push(&mut self, amount: Decimal) {
        self.total += amount;
    }

    pub fn pop(&mut self, amount: Decimal) -> Result<(), CoreError> {
        if is_approximately_zero(amount) {
            return Ok(());
        }
        if amount < Decimal::ZERO {
            return Err(CoreError::NegativeQuantity {
                kind: "domestic_cash",
                key: "domestic".to_string(),
                quantity: amount,
            });
        }
        if amount > self.total {
            let shortfall = amount - self.total;
            if shortfall <= CASH_OVERDRAW_TOLERANCE {
                self.total = Decimal::ZERO;
                return Ok(());
            }
            return Err(CoreError::Overdraw {
                kind: "domestic_cash",
                key: "domestic".to_string(),
                requested: amount,
                available: self.total,
            });
        }
        self.total -= amount;
        Ok(())
    }

    pub fn total(&self) -> Decimal {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CashLotSource, ShareLotSource};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn share_lot(qty: Decimal, buy_date: NaiveDate, price: Decimal) -> ShareLot {
        ShareLot::new("AAPL", qty, buy_date, price, Currency::USD, ShareLotSource::Buy)
    }

    #[test]
    fn push_keeps_lots_ordered_by_date_stable_on_ties() {
        let mut queue = ShareQueue::new("AAPL");
        queue.push(share_lot(dec!(1), date(2024, 1, 2), dec!(10)));
        queue.push(share_lot(dec!(2), date(2024, 1, 1), dec!(11)));
        queue.push(share_lot(dec!(3), date(2024, 1, 1), dec!(12)));

        let dates: Vec<_> = queue.lots().iter().map(|l| l.buy_date).collect();
        assert_eq!(dates, vec![date(2024, 1, 1), date(2024, 1, 1), date(2024, 1, 2)]);
        // first same-day push stays ahead of the second (stable insert).
        assert_eq!(queue.lots()[0].buy_price, dec!(11));
        assert_eq!(queue.lots()[1].buy_price, dec!(12));
    }

    #[test]
    fn pop_below_epsilon_is_noop() {
        let mut queue = ShareQueue::new("AAPL");
        queue.push(share_lot(dec!(10), date(2024, 1, 1), dec!(10)));
        let (popped, warnings) = queue.pop(dec!(0.00000000001), date(2024, 6, 1)).unwrap();
        assert!(popped.is_empty());
        assert!(warnings.is_empty());
        assert_eq!(queue.total_quantity(), dec!(10));
    }

    #[test]
    fn pop_negative_quantity_fails() {
        let mut queue = ShareQueue::new("AAPL");
        queue.push(share_lot(dec!(10), date(2024, 1, 1), dec!(10)));
        assert!(matches!(
            queue.pop(dec!(-1), date(2024, 6, 1)),
            Err(CoreError::NegativeQuantity { .. })
        ));
    }

    #[test]
    fn pop_from_empty_queue_fails() {
        let mut queue = ShareQueue::new("AAPL");
        assert!(matches!(
            queue.pop(dec!(1), date(2024, 6, 1)),
            Err(CoreError::EmptyQueue { .. })
        ));
    }

    #[test]
    fn pop_overdraw_fails_for_shares() {
        let mut queue = ShareQueue::new("AAPL");
        queue.push(share_lot(dec!(10), date(2024, 1, 1), dec!(10)));
        assert!(matches!(
            queue.pop(dec!(11), date(2024, 6, 1)),
            Err(CoreError::Overdraw { .. })
        ));
    }

    #[test]
    fn pop_not_yet_acquired_fails() {
        let mut queue = ShareQueue::new("AAPL");
        queue.push(share_lot(dec!(10), date(2024, 6, 1), dec!(10)));
        assert!(matches!(
            queue.pop(dec!(5), date(2024, 1, 1)),
            Err(CoreError::NotYetAcquired { .. })
        ));
    }

    #[test]
    fn pop_exact_total_leaves_empty_queue() {
        let mut queue = ShareQueue::new("AAPL");
        queue.push(share_lot(dec!(10), date(2024, 1, 1), dec!(10)));
        let (popped, _) = queue.pop(dec!(10), date(2024, 6, 1)).unwrap();
        assert_eq!(popped.len(), 1);
        assert!(queue.is_empty());
        assert_eq!(queue.total_quantity(), Decimal::ZERO);
    }

    #[test]
    fn pop_partial_consumption_decrements_head_in_place() {
        let mut queue = ShareQueue::new("AAPL");
        queue.push(share_lot(dec!(10), date(2024, 1, 1), dec!(10)));
        let (popped, _) = queue.pop(dec!(4), date(2024, 6, 1)).unwrap();
        assert_eq!(popped.len(), 1);
        assert_eq!(popped[0].quantity, dec!(4));
        assert_eq!(queue.total_quantity(), dec!(6));
        assert_eq!(queue.peek().unwrap().quantity, dec!(6));
    }

    #[test]
    fn pop_spans_multiple_lots() {
        let mut queue = ShareQueue::new("AAPL");
        queue.push(share_lot(dec!(3), date(2024, 1, 1), dec!(10)));
        queue.push(share_lot(dec!(5), date(2024, 2, 1), dec!(11)));
        let (popped, _) = queue.pop(dec!(6), date(2024, 6, 1)).unwrap();
        assert_eq!(popped.len(), 2);
        assert_eq!(popped[0].quantity, dec!(3));
        assert_eq!(popped[1].quantity, dec!(3));
        assert_eq!(queue.total_quantity(), dec!(2));
    }

    #[test]
    fn cash_queue_clamps_small_overdraw() {
        let mut queue = CashQueue::new(Currency::USD);
        queue.push(CashLot::new(
            Currency::USD,
            dec!(100),
            date(2024, 1, 1),
            CashLotSource::Deposit,
            false,
        ));
        let (popped, warnings) = queue.pop(dec!(100.5), date(2024, 6, 1)).unwrap();
        assert_eq!(popped[0].quantity, dec!(100));
        assert!(matches!(warnings[0], Warning::CashOverdrawClamped { .. }));
    }

    #[test]
    fn cash_queue_overdraw_beyond_tolerance_fails() {
        let mut queue = CashQueue::new(Currency::USD);
        queue.push(CashLot::new(
            Currency::USD,
            dec!(100),
            date(2024, 1, 1),
            CashLotSource::Deposit,
            false,
        ));
        assert!(matches!(
            queue.pop(dec!(101.5), date(2024, 6, 1)),
            Err(CoreError::Overdraw { .. })
        ));
    }

    #[test]
    fn dust_below_threshold_is_cleared() {
        let mut queue = CashQueue::new(Currency::USD);
        queue.push(CashLot::new(
            Currency::USD,
            dec!(10.001),
            date(2024, 1, 1),
            CashLotSource::Deposit,
            false,
        ));
        let (_, warnings) = queue.pop(dec!(10), date(2024, 6, 1)).unwrap();
        assert!(queue.is_empty());
        assert_eq!(queue.total_quantity(), Decimal::ZERO);
        assert!(matches!(warnings[0], Warning::DustCleared { .. }));
    }

    #[test]
    fn apply_split_scales_quantity_and_price_preserving_original() {
        let mut queue = ShareQueue::new("AAPL");
        queue.push(share_lot(dec!(10), date(2023, 1, 10), dec!(400)));
        queue.apply_split(dec!(2));
        let lot = queue.peek().unwrap();
        assert_eq!(lot.quantity, dec!(20));
        assert_eq!(lot.buy_price, dec!(200));
        assert_eq!(lot.cumulative_split_factor, dec!(2));
        assert_eq!(lot.original_buy_price, Some(dec!(400)));
        assert_eq!(queue.total_quantity(), dec!(20));
    }

    #[test]
    fn domestic_cash_bucket_ignores_dates_and_aggregates() {
        let mut bucket = DomesticCashBucket::default();
        bucket.push(dec!(100));
        bucket.push(dec!(50));
        bucket.pop(dec!(30)).unwrap();
        assert_eq!(bucket.total(), dec!(120));
    }
}
