//! Forecast with a saved pipeline
//!
//! Usage: cargo run --example predict -- --model output/aapl_multi.bin --data data/AAPL.csv

use anyhow::{Context, Result};
use clap::Parser;
use price_gru::utils::{init_logging, load_series_csv};
use price_gru::Pipeline;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Forecast the next closes with a trained pipeline")]
struct Args {
    /// Pipeline saved by train_gru
    #[arg(short, long)]
    model: PathBuf,

    /// CSV with recent closes
    #[arg(short, long)]
    data: PathBuf,

    #[arg(long, default_value = "Date")]
    date_column: String,

    #[arg(long, default_value = "Close")]
    close_column: String,

    /// Also score the model on every window of the data
    #[arg(long)]
    evaluate: bool,
}

fn main() -> Result<()> {
    init_logging("info");
    let args = Args::parse();

    let pipeline = Pipeline::load(&args.model)
        .with_context(|| format!("Failed to load pipeline {}", args.model.display()))?;
    let windower = pipeline.windower();

    println!(
        "{} {}-step model: lookback {}, horizon {}, {} parameters",
        pipeline.symbol(),
        pipeline.mode().name(),
        windower.lookback,
        windower.horizon,
        pipeline.model().num_parameters()
    );

    let series = load_series_csv(&args.data, pipeline.symbol(), &args.date_column, &args.close_column)?;
    let last = series.points().last().context("No closes in data file")?;
    println!("Last close: {:.2} on {}", last.close, last.date);

    let forecast = pipeline.forecast_next(&series)?;
    match forecast.as_slice() {
        [single] => println!("Close {} trading days ahead: {:.2}", windower.horizon, single),
        steps => {
            for (i, price) in steps.iter().enumerate() {
                println!("  day +{}: {:.2}", i + 1, price);
            }
        }
    }

    if args.evaluate {
        let evaluation = pipeline.evaluate_series(&series)?;
        println!("\n{:>6} {:>10} {:>10}", "step", "RMSE", "MAPE %");
        for m in evaluation.metrics() {
            println!("{:>6} {:>10.4} {:>10.2}", m.step, m.rmse, m.mape);
        }
    }

    Ok(())
}
