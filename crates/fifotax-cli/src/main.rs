use anyhow::Result;
use clap::Parser;
use fifotax_core::awv;
use fifotax_core::config::{Config, RateMode};
use fifotax_core::kernel::Kernel;
use fifotax_core::models::{AwvZ10, AwvZ4};
use fifotax_core::report::{TaxReport, consolidate};
use fifotax_core::{Warning, event};
use fifotax_money::Currency;
use serde::Serialize;

mod commands;
mod format;
mod ingest;

use commands::{Commands, OutputFormat, RateModeArg};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// A fully processed, FX-valued and year-consolidated report, carrying
/// enough alongside [`TaxReport`] for a formatter to also render the AWV
/// tables and any non-fatal warnings collected along the way.
pub struct Report {
    pub tax_report: TaxReport,
    pub awv_z4: Vec<AwvZ4>,
    pub awv_z10: Vec<AwvZ10>,
    pub warnings: Vec<Warning>,
    pub config: Config,
    pub domestic: Currency,
}

/// The JSON rendering of a [`Report`]: the tax-summary table plus the
/// threshold-filtered AWV tables, so a JSON consumer sees the same seven
/// tables the plain formatter prints (spec.md §6's five report tables plus
/// summary plus Z4/Z10).
#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    tax_report: &'a TaxReport,
    awv_z4: Vec<AwvZ4>,
    awv_z10: Vec<AwvZ10>,
    warnings: &'a [Warning],
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Events { file, prices } => {
            let events = ingest::load_events(file)?;
            let oracle = ingest::load_price_oracle(prices.as_deref())?;
            let (normalized, warnings) = event::normalize_events(events, &oracle);
            println!("{}", serde_json::to_string_pretty(&normalized)?);
            if !warnings.is_empty() {
                eprintln!("{} warning(s):", warnings.len());
                for warning in &warnings {
                    eprintln!("  {warning:?}");
                }
            }
        }
        Commands::Report {
            file,
            prices,
            rates,
            year,
            rate_mode,
            format: output_format,
        } => {
            let config = Config::load_with_overrides()
                .with_report_year(*year)
                .with_rate_mode(match rate_mode {
                    RateModeArg::Daily => RateMode::Daily,
                    RateModeArg::Monthly => RateMode::Monthly,
                });

            let events = ingest::load_events(file)?;
            let oracle = ingest::load_price_oracle(prices.as_deref())?;
            let provider = ingest::load_fx_cache(rates)?;

            let mut kernel = Kernel::new(&config);
            kernel.process(events, &oracle)?;
            kernel.apply_fx(&provider)?;

            let tax_report = consolidate(&kernel, &config, *year, config.rate_mode);
            let report = Report {
                tax_report,
                awv_z4: kernel.awv_z4.clone(),
                awv_z10: kernel.awv_z10.clone(),
                warnings: kernel.warnings.clone(),
                domestic: config.domestic_currency,
                config,
            };

            match output_format {
                OutputFormat::Plain => print!("{}", format::format(&report)),
                OutputFormat::Json => {
                    let json_report = JsonReport {
                        tax_report: &report.tax_report,
                        awv_z4: awv::generate_z4(&report.awv_z4, &report.config, *year),
                        awv_z10: awv::generate_z10(&report.awv_z10, &report.config, *year),
                        warnings: &report.warnings,
                    };
                    println!("{}", serde_json::to_string_pretty(&json_report)?);
                }
            }
        }
    }

    Ok(())
}
