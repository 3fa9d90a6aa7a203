//! JSON ingest adapters: events, price-oracle data and FX rates.
//!
//! Grounded on the teacher's `parser::parse_file` boundary — deserialize a
//! file straight into the domain types the core engine already understands,
//! with `anyhow` wrapping I/O and format errors at this CLI boundary only
//! (per SPEC_FULL.md's ambient error-handling section; the core crates never
//! depend on `anyhow`).

use anyhow::{Context, Result};
use chrono::NaiveDate;
use fifotax_core::Event;
use fifotax_fx::FxCache;
use fifotax_money::Currency;
use fifotax_price::StaticPriceOracle;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// `events.json`: a bare JSON array of tagged [`Event`] values.
pub fn load_events(path: &Path) -> Result<Vec<Event>> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading events file {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing events file {}", path.display()))
}

/// `prices.json`: `{"closes": {"AAPL": [["2024-01-02", "185.00"], ...]}, "splits": {...}}`.
#[derive(Debug, Deserialize)]
struct PriceData {
    closes: HashMap<String, Vec<(NaiveDate, Decimal)>>,
    #[serde(default)]
    splits: HashMap<String, Vec<(NaiveDate, Decimal)>>,
}

/// Load a [`StaticPriceOracle`] from `prices.json`. `path` is optional — an
/// absent price-oracle file yields an empty oracle, which treats every
/// quoted price as already historic (`PriceOracleMiss` warnings follow).
pub fn load_price_oracle(path: Option<&Path>) -> Result<StaticPriceOracle> {
    let Some(path) = path else {
        return Ok(StaticPriceOracle::new());
    };

    let content = std::fs::read_to_string(path).with_context(|| format!("reading price data file {}", path.display()))?;
    let data: PriceData = serde_json::from_str(&content).with_context(|| format!("parsing price data file {}", path.display()))?;

    let mut oracle = StaticPriceOracle::new();
    for (symbol, closes) in data.closes {
        for (date, close) in closes {
            oracle.insert_close(&symbol, date, close);
        }
    }
    for (symbol, splits) in data.splits {
        for (date, ratio) in splits {
            oracle.insert_split(&symbol, date, ratio);
        }
    }
    Ok(oracle)
}

/// `rates.json`: `{"domestic": "EUR", "rates": {"USD": [["2024-01-01", "1.10"], ...]}}`.
#[derive(Debug, Deserialize)]
struct RateData {
    domestic: String,
    rates: HashMap<String, Vec<(NaiveDate, Decimal)>>,
}

/// Load an [`FxCache`] from `rates.json`.
pub fn load_fx_cache(path: &Path) -> Result<FxCache> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading rates file {}", path.display()))?;
    let data: RateData = serde_json::from_str(&content).with_context(|| format!("parsing rates file {}", path.display()))?;
    let domestic = Currency::from_code(&data.domestic).with_context(|| format!("unrecognised domestic currency code {}", data.domestic))?;

    let mut cache = FxCache::new(domestic);
    for (code, entries) in data.rates {
        let currency = Currency::from_code(&code).with_context(|| format!("unrecognised currency code {code} in rates file"))?;
        for (date, rate) in entries {
            cache.insert(currency, date, rate);
        }
    }
    Ok(cache)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    fn write_temp(content: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        path.push(format!("fifotax-cli-ingest-test-{}-{n}", std::process::id()));
        std::fs::write(&path, content).expect("write temp fixture");
        path
    }

    #[test]
    fn loads_events_array() {
        let json = r#"[{"event":"money_deposit","date":"2024-01-01","buy_date":"2024-01-01","currency":"USD","amount":"100"}]"#;
        let path = write_temp(json);
        let events = load_events(&path).expect("events parse");
        assert_eq!(events.len(), 1);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_price_file_yields_empty_oracle() {
        let oracle = load_price_oracle(None).expect("empty oracle ok");
        assert_eq!(oracle.latest_close("AAPL"), None);
    }

    #[test]
    fn loads_price_data() {
        let json = r#"{"closes": {"AAPL": [["2024-01-02", "185.00"]]}, "splits": {"AAPL": [["2020-08-31", "4"]]}}"#;
        let path = write_temp(json);
        let oracle = load_price_oracle(Some(&path)).expect("price data parse");
        assert_eq!(oracle.latest_close("AAPL"), Some(rust_decimal_macros::dec!(185.00)));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn loads_rate_data() {
        let json = r#"{"domestic": "EUR", "rates": {"USD": [["2024-01-01", "1.10"]]}}"#;
        let path = write_temp(json);
        let cache = load_fx_cache(&path).expect("rate data parse");
        assert_eq!(cache.supported().len(), 2);
        let _ = std::fs::remove_file(path);
    }
}
