use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use clap::Parser;

use quant_lens::utils::TimeUtils;
use quant_lens::{
    Chain, ChainFile, OptionContract, OptionType, PriceBar, Series, SeriesCollection, SeriesFile,
};

/// Write deterministic demo input files for the quant-lens CLI.
#[derive(Parser, Debug)]
struct Args {
    /// Output directory
    #[arg(long, default_value = "demo")]
    out_dir: PathBuf,

    /// Bars per symbol
    #[arg(long, default_value_t = 260)]
    bars: usize,

    /// Write bincode (.bin) instead of JSON
    #[arg(long, default_value_t = false)]
    binary: bool,
}

// (symbol, start price, drift per bar, swing amplitude)
const DEMO_SYMBOLS: &[(&str, f64, f64, f64)] = &[
    ("NIFTY", 21_500.0, 6.0, 180.0),
    ("RELIANCE.NS", 2_900.0, -1.2, 45.0),
    ("TCS.NS", 3_800.0, 0.2, 60.0),
    ("INFY.NS", 1_500.0, 0.9, 20.0),
];

const START_MS: i64 = 1_704_067_200_000; // 2024-01-01

fn synthetic_series(symbol: &str, bars: usize, start: f64, drift: f64, swing: f64) -> Series {
    let rows: Vec<PriceBar> = (0..bars)
        .map(|i| {
            let x = i as f64;
            let close = start + drift * x + swing * (x * 0.11).sin() + 0.3 * swing * (x * 0.57).cos();
            let open = close - 0.15 * swing * (x * 0.83).sin();
            let wick = 0.1 * swing * (1.0 + (x * 0.29).cos().abs());
            let volume = 1_000_000.0 * (1.0 + 0.4 * (x * 0.23).sin().abs());
            PriceBar::new(
                START_MS + i as i64 * TimeUtils::MS_IN_D,
                open,
                open.max(close) + wick,
                open.min(close) - wick,
                close,
                volume,
            )
        })
        .collect();
    Series::from_bars(symbol, &rows)
}

fn synthetic_chain(underlying: &str, spot: f64, first_expiry: NaiveDate) -> Chain {
    let atm = (spot / 50.0).round() * 50.0;
    let mut contracts = Vec::new();
    for week in 0..3 {
        let expiry = first_expiry + Duration::days(7 * week);
        for step in -6i32..=6 {
            let strike = atm + 50.0 * step as f64;
            let distance = step.unsigned_abs() as u64;
            let iv = 13.0 + 0.4 * distance as f64 + week as f64;
            let call_oi = 40_000 + 12_000 * (6 + step).max(0) as u64;
            let put_oi = 40_000 + 12_000 * (6 - step).max(0) as u64;
            contracts.push(
                OptionContract::new(strike, OptionType::Call, call_oi / (1 + distance / 3))
                    .with_expiry(expiry)
                    .with_iv(iv),
            );
            contracts.push(
                OptionContract::new(strike, OptionType::Put, put_oi / (1 + distance / 3))
                    .with_expiry(expiry)
                    .with_iv(iv + 1.5),
            );
        }
    }
    Chain::new(underlying, spot, contracts)
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
    let args = Args::parse();
    let ext = if args.binary { "bin" } else { "json" };

    let series: Vec<Series> = DEMO_SYMBOLS
        .iter()
        .map(|&(symbol, start, drift, swing)| synthetic_series(symbol, args.bars, start, drift, swing))
        .collect();

    let nifty = &series[0];
    let spot = nifty.last_close().context("Demo series is empty")?;
    let last_day = nifty
        .last_timestamp_ms()
        .and_then(quant_lens::utils::time_utils::epoch_ms_to_date)
        .context("Demo series has no usable timestamp")?;
    let chain = synthetic_chain(&nifty.symbol, spot, last_day + Duration::days(4));

    let series_path = args.out_dir.join(format!("demo_series.{}", ext));
    SeriesFile::new(SeriesCollection::new("Demo daily series", series)).save_to_path(&series_path)?;

    let chain_path = args.out_dir.join(format!("demo_chain.{}", ext));
    ChainFile::new(chain).save_to_path(&chain_path)?;

    println!(
        "Demo files written: {} and {}",
        series_path.display(),
        chain_path.display()
    );
    Ok(())
}
