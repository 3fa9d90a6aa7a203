use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Normalise an event stream (split-adjustment) and print it as JSON
    Events {
        /// Input events file (JSON array of tagged events)
        file: PathBuf,

        /// Price-oracle data file (closes + splits) used for split detection
        #[arg(long)]
        prices: Option<PathBuf>,
    },
    /// Run the full pipeline and print a consolidated tax report
    Report {
        /// Input events file
        file: PathBuf,

        /// Price-oracle data file (closes + splits)
        #[arg(long)]
        prices: Option<PathBuf>,

        /// FX rate data file
        #[arg(long)]
        rates: PathBuf,

        /// Calendar year to consolidate
        #[arg(long)]
        year: i32,

        /// Domestic-currency valuation basis
        #[arg(long, value_enum, default_value = "daily")]
        rate_mode: RateModeArg,

        #[arg(long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum RateModeArg {
    Daily,
    Monthly,
}
