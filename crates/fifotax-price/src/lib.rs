//! Historical close-price and stock-split oracle.
//!
//! Defines [`PriceOracle`], the read-only collaborator event normalisation
//! consults to detect un-adjusted broker prices and derive implied split
//! factors, plus [`StaticPriceOracle`], a deterministic in-memory reference
//! implementation useful for tests and small manual datasets. A production
//! deployment backs `PriceOracle` with its own market-data client.

mod oracle;
mod static_oracle;

pub use oracle::{HISTORIC_TOLERANCE, LOOKBACK_DAYS, PriceOracle};
pub use static_oracle::StaticPriceOracle;
