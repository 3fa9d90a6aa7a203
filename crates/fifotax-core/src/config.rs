//! Configuration for the accounting engine.
//!
//! Mirrors the teacher's embedded-TOML-with-overrides loader: institutional
//! defaults (domestic currency, AWV threshold schedule, speculative period)
//! are compiled into the binary and may be overridden by a file on disk.
//! Per-run selections (`report_year`, `rate_mode`) have no sensible embedded
//! default and are supplied by the caller after loading.

use fifotax_money::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Embedded institutional defaults.
static EMBEDDED_CONFIG: &str = include_str!("../data/config.toml");

/// FX valuation basis selected for a report run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateMode {
    #[default]
    Daily,
    Monthly,
}

/// Raw configuration as parsed from TOML (uses string keys for the
/// threshold schedule, since TOML tables require string keys).
#[derive(Debug, Clone, Deserialize)]
struct RawConfig {
    domestic_currency: String,
    speculative_period_days: i64,
    consider_tax_free_forex: bool,
    apply_stock_splits: bool,
    #[serde(default)]
    awv_thresholds: HashMap<String, Decimal>,
}

/// Engine configuration: the six recognised options plus the domestic
/// currency and the AWV threshold schedule.
#[derive(Debug, Clone)]
pub struct Config {
    /// Mandatory: the calendar year the report consolidates.
    pub report_year: Option<i32>,
    pub rate_mode: RateMode,
    pub apply_stock_splits: bool,
    /// Overrides the threshold schedule lookup for `awv_threshold_dom` when set.
    pub awv_threshold_dom: Option<Decimal>,
    pub speculative_period_days: i64,
    pub consider_tax_free_forex: bool,
    pub domestic_currency: Currency,
    /// AWV threshold schedule, keyed by first-applicable year.
    pub awv_thresholds: HashMap<u16, Decimal>,
}

impl Default for Config {
    fn default() -> Self {
        Self::embedded()
    }
}

impl Config {
    /// Load the embedded default configuration.
    pub fn embedded() -> Self {
        Self::from_toml(EMBEDDED_CONFIG).unwrap_or_else(|e| {
            eprintln!("Warning: Failed to parse embedded config: {e}");
            Self {
                report_year: None,
                rate_mode: RateMode::default(),
                apply_stock_splits: true,
                awv_threshold_dom: None,
                speculative_period_days: 365,
                consider_tax_free_forex: true,
                domestic_currency: Currency::EUR,
                awv_thresholds: HashMap::new(),
            }
        })
    }

    fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        let raw: RawConfig = toml::from_str(content)?;
        let domestic_currency = Currency::from_code(&raw.domestic_currency).unwrap_or(Currency::EUR);
        let awv_thresholds = raw
            .awv_thresholds
            .into_iter()
            .filter_map(|(k, v)| k.parse::<u16>().ok().map(|year| (year, v)))
            .collect();

        Ok(Self {
            report_year: None,
            rate_mode: RateMode::default(),
            apply_stock_splits: raw.apply_stock_splits,
            awv_threshold_dom: None,
            speculative_period_days: raw.speculative_period_days,
            consider_tax_free_forex: raw.consider_tax_free_forex,
            domestic_currency,
            awv_thresholds,
        })
    }

    /// Load configuration with override support.
    ///
    /// Checks for override files in the following order:
    /// 1. `./config.toml` (current directory)
    /// 2. `~/.config/fifotax-tool/config.toml` (user config directory)
    ///
    /// Override files are merged with embedded defaults; values present in
    /// an override file take precedence.
    pub fn load_with_overrides() -> Self {
        let mut config = Self::embedded();

        for path in Self::override_paths() {
            if path.exists()
                && let Ok(content) = std::fs::read_to_string(&path)
                && let Ok(override_config) = Self::from_toml(&content)
            {
                config.apply_stock_splits = override_config.apply_stock_splits;
                config.speculative_period_days = override_config.speculative_period_days;
                config.consider_tax_free_forex = override_config.consider_tax_free_forex;
                config.domestic_currency = override_config.domestic_currency;
                config.awv_thresholds.extend(override_config.awv_thresholds);
            }
        }

        config
    }

    fn override_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];
        if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
            paths.push(home.join(".config").join("fifotax-tool").join("config.toml"));
        }
        paths
    }

    pub fn with_report_year(mut self, year: i32) -> Self {
        self.report_year = Some(year);
        self
    }

    pub fn with_rate_mode(mut self, mode: RateMode) -> Self {
        self.rate_mode = mode;
        self
    }

    /// The AWV reporting threshold in effect for `year`: the configured
    /// override if set, otherwise the highest schedule entry whose key does
    /// not exceed `year`, defaulting to the pre-1999 floor of `12 500`.
    pub fn awv_threshold_for_year(&self, year: i32) -> Decimal {
        if let Some(threshold) = self.awv_threshold_dom {
            return threshold;
        }

        self.awv_thresholds
            .iter()
            .filter(|(&first_year, _)| i32::from(first_year) <= year)
            .max_by_key(|(&first_year, _)| first_year)
            .map(|(_, threshold)| *threshold)
            .unwrap_or(Decimal::from(12_500))
    }
}
