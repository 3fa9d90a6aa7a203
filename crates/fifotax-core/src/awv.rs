//! AWV (balance-of-payments) generator (component I): threshold filter and
//! categorical Z4/Z10 split, per spec.md §4.I.
//!
//! Grounded on `pyfifotax/data_structures_awv.py`'s closed purpose
//! dictionaries (carried as [`crate::models::AwvZ4Purpose`] /
//! [`crate::models::AwvZ10Purpose`]) and on the teacher's
//! `cgt_core::calculator`-style filter-then-sort shape.

use crate::config::Config;
use crate::models::{AwvZ10, AwvZ4};
use chrono::Datelike;
use rust_decimal::Decimal;

/// `YYYY-M` reporting-period key used to group/sort AWV entries (Glossary).
fn reporting_period(year: i32, month: u32) -> String {
    format!("{year:04}-{month:02}")
}

/// Filter Z4 entries to `date.year() == year` and `value_dom >= threshold`,
/// sorted by reporting period.
pub fn generate_z4(entries: &[AwvZ4], config: &Config, year: i32) -> Vec<AwvZ4> {
    let threshold = config.awv_threshold_for_year(year);
    let mut filtered: Vec<AwvZ4> = entries
        .iter()
        .filter(|e| e.date.year() == year)
        .filter(|e| e.value_dom.is_some_and(|v| v >= threshold))
        .cloned()
        .collect();
    filtered.sort_by_key(|e| reporting_period(e.date.year(), e.date.month()));
    filtered
}

/// Filter Z10 entries to `date.year() == year` and `value_dom >= threshold`,
/// sorted by reporting period.
pub fn generate_z10(entries: &[AwvZ10], config: &Config, year: i32) -> Vec<AwvZ10> {
    let threshold = config.awv_threshold_for_year(year);
    let mut filtered: Vec<AwvZ10> = entries
        .iter()
        .filter(|e| e.date.year() == year)
        .filter(|e| e.value_dom.is_some_and(|v| v >= threshold))
        .cloned()
        .collect();
    filtered.sort_by_key(|e| reporting_period(e.date.year(), e.date.month()));
    filtered
}

/// Sum of `value_dom` dropped by the threshold filter, for a caller that
/// wants to log/display what was excluded rather than silently lose it.
pub fn dropped_below_threshold(entries: &[AwvZ10], config: &Config, year: i32) -> Decimal {
    let threshold = config.awv_threshold_for_year(year);
    entries
        .iter()
        .filter(|e| e.date.year() == year)
        .filter_map(|e| e.value_dom)
        .filter(|v| *v < threshold)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AwvZ10Purpose, AwvZ4Purpose};
    use chrono::NaiveDate;
    use fifotax_money::Currency;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn z10(date_: NaiveDate, value_dom: Decimal) -> AwvZ10 {
        AwvZ10 {
            date: date_,
            symbol: "NVDA".to_string(),
            currency: Currency::USD,
            value: value_dom,
            value_dom: Some(value_dom),
            is_incoming: true,
            purpose: AwvZ10Purpose::Sale,
        }
    }

    #[test]
    fn threshold_for_2025_drops_45k_keeps_50k_scenario_6() {
        let config = Config::embedded();
        let entries = vec![z10(date(2025, 3, 1), dec!(45000)), z10(date(2025, 4, 1), dec!(50000))];
        let kept = generate_z10(&entries, &config, 2025);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].value_dom, Some(dec!(50000)));
    }

    #[test]
    fn same_value_kept_in_2024_below_2025_threshold() {
        let config = Config::embedded();
        let entries = vec![z10(date(2024, 3, 1), dec!(45000))];
        let kept = generate_z10(&entries, &config, 2024);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn entries_outside_requested_year_are_excluded() {
        let config = Config::embedded();
        let entries = vec![z10(date(2023, 3, 1), dec!(100000))];
        assert!(generate_z10(&entries, &config, 2024).is_empty());
    }

    #[test]
    fn sorted_by_reporting_period() {
        let config = Config::embedded();
        let entries = vec![z10(date(2024, 11, 1), dec!(100000)), z10(date(2024, 2, 1), dec!(100000))];
        let kept = generate_z10(&entries, &config, 2024);
        assert_eq!(kept[0].date.month(), 2);
        assert_eq!(kept[1].date.month(), 11);
    }

    #[test]
    fn z4_filters_by_year_and_threshold() {
        let config = Config::embedded();
        let entries = vec![AwvZ4 {
            date: date(2025, 1, 1),
            symbol: "NVDA".to_string(),
            currency: Currency::USD,
            value: dec!(60000),
            value_dom: Some(dec!(60000)),
            is_incoming: true,
            purpose: AwvZ4Purpose::RsuBonus,
        }];
        assert_eq!(generate_z4(&entries, &config, 2025).len(), 1);
        assert_eq!(generate_z4(&entries, &config, 2024).len(), 0);
    }
}
