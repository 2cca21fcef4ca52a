//! Full pipeline on a synthetic price series
//!
//! Trains the multi-step and single-step variants on the same series and
//! compares their test RMSE at the last horizon step.
//!
//! Run: cargo run --example full_pipeline --release

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use price_gru::preprocessing::LabelMode;
use price_gru::utils::{init_logging, ForecastConfig};
use price_gru::{Pipeline, PriceSeries};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Business-day random walk with drift and a slow cycle
fn synthetic_series(days: usize, seed: u64) -> anyhow::Result<PriceSeries> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut date = NaiveDate::from_ymd_opt(2019, 1, 2).ok_or_else(|| anyhow::anyhow!("bad date"))?;
    let mut price = 150.0_f64;

    let mut dates = Vec::with_capacity(days);
    let mut closes = Vec::with_capacity(days);

    while dates.len() < days {
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            let t = dates.len() as f64;
            price *= 1.0 + 0.0004 + 0.002 * (t / 40.0).sin() + rng.gen_range(-0.015..0.015);
            dates.push(date);
            closes.push(price);
        }
        date += Duration::days(1);
    }

    Ok(PriceSeries::from_parts("SYNTH", &dates, &closes)?)
}

fn main() -> anyhow::Result<()> {
    init_logging("info");

    println!("=== GRU close-price forecasting ===\n");

    let series = synthetic_series(1000, 7)?;
    println!(
        "Series: {} business days, {:.2} -> {:.2}",
        series.len(),
        series.points()[0].close,
        series.points()[series.len() - 1].close
    );

    let config = ForecastConfig::default().with_seed(42);
    println!(
        "Lookback {}, horizon {}, {} epochs, lr {}\n",
        config.window.lookback,
        config.window.forecast_horizon,
        config.training.num_epochs,
        config.training.learning_rate
    );

    let (multi, multi_report) = Pipeline::train(&series, &config, LabelMode::AllSteps)?;
    println!("{}", multi_report);

    let (single, single_report) = Pipeline::train(&series, &config, LabelMode::LastStepOnly)?;
    println!("{}", single_report);

    let horizon = config.window.forecast_horizon;
    let multi_last = multi_report.test.rmse_per_step()[horizon - 1];
    let single_last = single_report.test.rmse_per_step()[0];
    println!("Day {} test RMSE: multi-step {:.4}, single-step {:.4}", horizon, multi_last, single_last);

    // last few rows of the day-7 test table
    if let Some(table) = multi_report.test.table(horizon) {
        println!("\nMulti-step, day {} (test tail):", horizon);
        println!("{:>12} {:>10} {:>10}", "date", "predicted", "actual");
        for row in table.rows().iter().rev().take(5).rev() {
            println!("{:>12} {:>10.2} {:>10.2}", row.date, row.predicted, row.actual);
        }
    }

    println!("\nNext {} days (multi-step): {:?}", horizon, round2(&multi.forecast_next(&series)?));
    println!("Day {} (single-step): {:?}", horizon, round2(&single.forecast_next(&series)?));

    Ok(())
}

fn round2(values: &[f64]) -> Vec<f64> {
    values.iter().map(|v| (v * 100.0).round() / 100.0).collect()
}
