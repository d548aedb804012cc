//! Command-line parsing for the forecast-vs-DCF signal tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the forecasting/valuation code.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "dsig",
    version,
    about = "Next-close forecast (random forest) vs. DCF implied price"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Forecast the next close, value the company, and print the recommendation.
    Run(RunArgs),
    /// Forecasting side only: tune, score out-of-sample, predict the next close.
    Forecast(ForecastCmdArgs),
    /// Valuation side only: print the DCF table and implied share price.
    Dcf(DcfArgs),
    /// Full pipeline on a synthetic price series and the built-in example assumptions.
    Demo(DemoArgs),
}

/// Options shared by every command that runs the forecaster.
#[derive(Debug, Args, Clone)]
pub struct ForecastArgs {
    /// Target column (the price being forecast).
    #[arg(long, default_value = "close_price")]
    pub target: String,

    /// Date column.
    #[arg(long = "date-column", default_value = "date")]
    pub date_column: String,

    /// Number of random hyperparameter candidates.
    #[arg(long, default_value_t = 40)]
    pub trials: usize,

    /// Number of walk-forward validation folds.
    #[arg(long, default_value_t = 5)]
    pub folds: usize,

    /// Base seed for candidate sampling and forest fitting.
    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// Write a markdown bundle of every search trial under `debug/`.
    #[arg(long = "debug-bundle")]
    pub debug_bundle: bool,
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Cleaned price CSV (one row per trading date).
    #[arg(long, value_name = "FILE")]
    pub csv: PathBuf,

    /// DCF assumptions JSON.
    #[arg(long, value_name = "JSON")]
    pub assumptions: PathBuf,

    #[command(flatten)]
    pub forecast: ForecastArgs,

    /// Export the full run result to JSON.
    #[arg(long = "export-json", value_name = "FILE")]
    pub export_json: Option<PathBuf>,

    /// Export the per-year cash-flow table to CSV.
    #[arg(long = "export-cashflows", value_name = "FILE")]
    pub export_cashflows: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ForecastCmdArgs {
    /// Cleaned price CSV (one row per trading date).
    #[arg(long, value_name = "FILE")]
    pub csv: PathBuf,

    #[command(flatten)]
    pub forecast: ForecastArgs,

    /// Export the forecast result to JSON.
    #[arg(long = "export-json", value_name = "FILE")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct DcfArgs {
    /// DCF assumptions JSON.
    #[arg(long, value_name = "JSON")]
    pub assumptions: PathBuf,

    /// Export the valuation to JSON.
    #[arg(long = "export-json", value_name = "FILE")]
    pub export_json: Option<PathBuf>,

    /// Export the per-year cash-flow table to CSV.
    #[arg(long = "export-cashflows", value_name = "FILE")]
    pub export_cashflows: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Length of the synthetic series (business days).
    #[arg(long, default_value_t = 500)]
    pub days: usize,

    /// Annualized drift of the synthetic series.
    #[arg(long, default_value_t = 0.08)]
    pub mu: f64,

    /// Annualized volatility of the synthetic series.
    #[arg(long, default_value_t = 0.25)]
    pub sigma: f64,

    /// Seed for the synthetic series.
    #[arg(long = "sample-seed", default_value_t = 42)]
    pub sample_seed: u64,

    #[command(flatten)]
    pub forecast: ForecastArgs,

    /// Save the example assumptions as a JSON template.
    #[arg(long = "write-assumptions", value_name = "JSON")]
    pub write_assumptions: Option<PathBuf>,

    /// Export the full run result to JSON.
    #[arg(long = "export-json", value_name = "FILE")]
    pub export_json: Option<PathBuf>,

    /// Export the per-year cash-flow table to CSV.
    #[arg(long = "export-cashflows", value_name = "FILE")]
    pub export_cashflows: Option<PathBuf>,
}
