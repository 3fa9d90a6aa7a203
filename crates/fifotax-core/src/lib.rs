//! The FIFO tax-lot accounting engine core.
//!
//! A pure function from (events, oracle snapshot, rates snapshot, config) to
//! report tables (spec.md §6): no persisted state, no network or disk
//! access of its own. Callers drive the pipeline in four steps:
//!
//! 1. [`event::normalize_events`] (run implicitly by [`kernel::Kernel::process`])
//!    rewrites any pre-split broker quote onto a historic basis.
//! 2. [`kernel::Kernel::process`] sorts by `(date, priority)` and dispatches
//!    every event, mutating the lot queues and emitting sold-lot/AWV records.
//! 3. [`kernel::Kernel::apply_fx`] attaches daily/monthly domestic-currency
//!    valuations to every emitted record.
//! 4. [`report::consolidate`] and [`awv::generate_z4`]/[`awv::generate_z10`]
//!    filter by year and aggregate into the final report tables.

pub mod awv;
pub mod config;
pub mod error;
pub mod event;
pub mod kernel;
pub mod models;
pub mod queue;
pub mod report;
pub mod valuation;
pub mod warning;

pub use config::{Config, RateMode};
pub use error::CoreError;
pub use event::{Event, TaxAdjustment};
pub use kernel::Kernel;
pub use models::*;
pub use report::{CashTaxStatus, ForexRow, ShareRow, Summary, TaxReport};
pub use warning::Warning;
