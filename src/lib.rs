#![allow(clippy::const_is_empty)]
#![allow(clippy::collapsible_if)]
#![allow(clippy::type_complexity)]

// Core modules
pub mod analysis;
pub mod cache;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod models;
pub mod options;
pub mod utils;

// Re-export commonly used types
pub use analysis::{
    BreakoutResult, IndicatorSnapshot, MultiSymbolScanner, Regime, RegimeResult, ScanReport,
    SupportResistance, compute_snapshot, detect_breakout, detect_market_regime,
};
pub use cache::{TtlCache, make_cache_key};
pub use data::{ChainFile, SeriesCollection, SeriesFile};
pub use domain::{Chain, OptionContract, OptionType, Period, PriceBar, Series};
pub use error::{AnalyticsError, Result};
pub use models::{AnalyticsReport, OptionsReport, build_options_report, build_report};
pub use options::{Greeks, OptionParams, black_scholes_greeks, calculate_max_pain};

use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
// CLI argument parsing
use clap::Parser;

use crate::config::OPTIONS;
use crate::utils::time_utils::epoch_ms_to_date;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Series file to analyse (.bin is read as bincode, anything else as JSON)
    pub series: PathBuf,

    /// Only analyse this symbol
    #[arg(long)]
    pub symbol: Option<String>,

    /// Option chain file; adds max pain, open interest and Greeks to the matching report
    #[arg(long)]
    pub chain: Option<PathBuf>,

    /// Valuation date for Greeks (YYYY-MM-DD). Defaults to the last bar's date
    #[arg(long)]
    pub valuation_date: Option<NaiveDate>,

    /// Option expiry to analyse (YYYY-MM-DD). Defaults to the nearest one in the chain
    #[arg(long)]
    pub expiry: Option<NaiveDate>,

    /// Annualised risk-free rate used for Greeks
    #[arg(long, default_value_t = OPTIONS.risk_free_rate)]
    pub risk_free_rate: f64,

    /// Run the batch buy/sell/hold scan instead of per-symbol reports
    #[arg(long, default_value_t = false)]
    pub scan: bool,

    /// Pretty-print the JSON output
    #[arg(long, default_value_t = false)]
    pub pretty: bool,
}

/// Load the files named in `args`, run the requested analysis and render it as JSON.
/// This is the public API for the binary to call.
pub fn run_cli(args: &Cli) -> anyhow::Result<String> {
    let file = SeriesFile::load_from_path(&args.series)?;
    let selected: Vec<&Series> = match &args.symbol {
        Some(symbol) => vec![file.data.find(symbol)?],
        None => file.data.series.iter().collect(),
    };

    let output = if args.scan {
        serde_json::to_value(analysis::scan_all(&selected))?
    } else {
        let mut reports = selected
            .iter()
            .map(|s| build_report(s).with_context(|| format!("Failed to analyse {}", s.symbol)))
            .collect::<anyhow::Result<Vec<AnalyticsReport>>>()?;

        if let Some(chain_path) = &args.chain {
            attach_options(&mut reports, &selected, chain_path, args)?;
        }
        serde_json::to_value(reports)?
    };

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    Ok(rendered)
}

fn attach_options(
    reports: &mut [AnalyticsReport],
    selected: &[&Series],
    chain_path: &std::path::Path,
    args: &Cli,
) -> anyhow::Result<()> {
    let chain = ChainFile::load_from_path(chain_path)?.chain;

    let target = reports
        .iter()
        .position(|r| r.symbol.eq_ignore_ascii_case(&chain.underlying))
        .or_else(|| (reports.len() == 1).then_some(0));
    let Some(idx) = target else {
        log::warn!(
            "Option chain for {} matches none of the {} analysed symbols, skipping",
            chain.underlying,
            reports.len()
        );
        return Ok(());
    };

    let valuation = args
        .valuation_date
        .or_else(|| selected[idx].last_timestamp_ms().and_then(epoch_ms_to_date))
        .unwrap_or_else(|| Utc::now().date_naive());

    let options = build_options_report(&chain, valuation, args.expiry, args.risk_free_rate)
        .with_context(|| format!("Failed to analyse option chain for {}", chain.underlying))?;
    reports[idx].options = Some(options);
    Ok(())
}
