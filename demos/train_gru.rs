//! Train a GRU forecaster on a CSV of daily closes
//!
//! Usage: cargo run --example train_gru --release -- --data data/AAPL.csv --symbol AAPL --mode both

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use price_gru::preprocessing::LabelMode;
use price_gru::utils::{init_logging, load_series_csv, parse_date, ForecastConfig};
use price_gru::Pipeline;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Predict every day of the horizon
    Multi,
    /// Predict only the last day of the horizon
    Single,
    Both,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Train GRU close-price forecasters")]
struct Args {
    /// Input CSV with a header row
    #[arg(short, long)]
    data: PathBuf,

    /// Ticker used in logs and output names
    #[arg(short, long, default_value = "AAPL")]
    symbol: String,

    /// TOML config; defaults are used when absent
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "both")]
    mode: Mode,

    /// Date column name
    #[arg(long, default_value = "Date")]
    date_column: String,

    /// Close column name
    #[arg(long, default_value = "Close")]
    close_column: String,

    /// First date to keep (YYYY-MM-DD)
    #[arg(long)]
    start: Option<String>,

    /// Last date to keep (YYYY-MM-DD)
    #[arg(long)]
    end: Option<String>,

    /// Override the number of epochs
    #[arg(long)]
    epochs: Option<usize>,

    /// Seed for weight initialization
    #[arg(long)]
    seed: Option<u64>,

    /// Output directory for pipelines, histories and tables
    #[arg(short, long, default_value = "output")]
    output: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ForecastConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ForecastConfig::default(),
    };
    if let Some(epochs) = args.epochs {
        config = config.with_epochs(epochs);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    init_logging(&config.logging.level);

    let mut series = load_series_csv(&args.data, &args.symbol, &args.date_column, &args.close_column)
        .with_context(|| format!("Failed to load {}", args.data.display()))?;

    if args.start.is_some() || args.end.is_some() {
        let start = match &args.start {
            Some(s) => parse_date(s)?,
            None => series.first_date().context("Series is empty")?,
        };
        let end = match &args.end {
            Some(s) => parse_date(s)?,
            None => series.last_date().context("Series is empty")?,
        };
        series = series.between(start, end);
    }

    println!(
        "Loaded {} closes for {} ({} .. {})",
        series.len(),
        series.symbol(),
        series.first_date().map(|d| d.to_string()).unwrap_or_default(),
        series.last_date().map(|d| d.to_string()).unwrap_or_default()
    );

    let modes: &[LabelMode] = match args.mode {
        Mode::Multi => &[LabelMode::AllSteps],
        Mode::Single => &[LabelMode::LastStepOnly],
        Mode::Both => &[LabelMode::AllSteps, LabelMode::LastStepOnly],
    };

    std::fs::create_dir_all(&args.output)?;

    for &mode in modes {
        println!("\n=== {} {}-step ===", series.symbol(), mode.name());

        let (pipeline, report) = Pipeline::train(&series, &config, mode)
            .with_context(|| format!("Training the {}-step model failed", mode.name()))?;

        println!("{}", report);

        let stem = format!("{}_{}", series.symbol().to_lowercase(), mode.name());
        let model_path = args.output.join(format!("{}.bin", stem));
        pipeline.save(&model_path)?;
        pipeline
            .history()
            .save_csv(args.output.join(format!("{}_loss.csv", stem)))?;
        report.train.save_tables(&args.output, &format!("{}_train", stem))?;
        report.test.save_tables(&args.output, &format!("{}_test", stem))?;

        println!("Saved pipeline to {}", model_path.display());
    }

    Ok(())
}
