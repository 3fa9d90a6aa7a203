//! Foreign-exchange reference-rate interface.
//!
//! Defines [`FxRateProvider`], the read-only collaborator the accounting
//! core consults to convert foreign amounts into the domestic currency, plus
//! [`FxCache`], a deterministic in-memory reference implementation useful
//! for tests and small manual datasets. A production deployment backs
//! `FxRateProvider` with its own bulk historical time-series loader; that
//! loader is outside this crate's scope.

mod cache;
mod error;
mod provider;
mod types;

pub use cache::FxCache;
pub use error::FxError;
pub use iso_currency::Currency;
pub use provider::FxRateProvider;
pub use types::RateKey;
