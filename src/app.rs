//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - loads the price CSV and assumptions JSON
//! - runs forecasting, valuation and the decision
//! - prints reports and writes optional exports

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, DcfArgs, DemoArgs, ForecastArgs, ForecastCmdArgs, RunArgs};
use crate::data::SeriesSpec;
use crate::domain::{DcfAssumptions, ExportPaths, ForecastConfig, TunerConfig};
use crate::error::AppError;
use crate::forecast::ForecastRun;
use crate::io::RunExport;

pub mod pipeline;

/// Directory that receives debug bundles.
const DEBUG_DIR: &str = "debug";

/// Entry point for the `dsig` binary.
pub fn run() -> Result<(), AppError> {
    // Flags given without a subcommand (`dsig --csv ... --assumptions ...`)
    // are treated as `dsig run ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    init_tracing(cli.verbose);

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Forecast(args) => handle_forecast(args),
        Command::Dcf(args) => handle_dcf(args),
        Command::Demo(args) => handle_demo(args),
    }
}

/// Install the stderr log subscriber.
///
/// `.env` is read first so `RUST_LOG` may live there. An explicit `RUST_LOG`
/// wins over `-v` flags.
fn init_tracing(verbose: u8) {
    dotenvy::dotenv().ok();
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = forecast_config_from_args(&args.forecast);
    let exports = ExportPaths {
        json: args.export_json.clone(),
        cashflows: args.export_cashflows.clone(),
        debug_bundle: args.forecast.debug_bundle,
    };

    // Assumptions first: a bad file should fail before any model is fitted.
    let assumptions = crate::io::read_assumptions(&args.assumptions)?;
    let ingest = crate::io::load_price_table(&args.csv, &config)?;

    let source = format!(
        "{} ({} rows, {} .. {})",
        args.csv.display(),
        ingest.rows_read,
        ingest.first_date,
        ingest.last_date
    );
    let run = pipeline::run_full(&ingest.dataset, &assumptions, &config)?;
    print_full_run(&run, &source);
    write_exports(&run, &config, &exports)
}

fn handle_forecast(args: ForecastCmdArgs) -> Result<(), AppError> {
    let config = forecast_config_from_args(&args.forecast);
    let ingest = crate::io::load_price_table(&args.csv, &config)?;
    let run = pipeline::forecast_from_prices(&ingest.dataset, &config)?;

    println!(
        "{}",
        crate::report::format_forecast_summary(&run, &args.csv.display().to_string())
    );

    if let Some(path) = &args.export_json {
        crate::io::write_result_json(path, &RunExport::new(Some(&run.output), None, None))?;
        info!(path = %path.display(), "wrote result JSON");
    }
    if args.forecast.debug_bundle {
        report_debug_bundle(&run, &config)?;
    }
    Ok(())
}

fn handle_dcf(args: DcfArgs) -> Result<(), AppError> {
    let assumptions = crate::io::read_assumptions(&args.assumptions)?;
    let valuation = crate::valuation::calculate_dcf(&assumptions)?;

    println!("{}", crate::report::format_valuation(&valuation));

    if let Some(path) = &args.export_json {
        crate::io::write_result_json(path, &RunExport::new(None, Some(&valuation), None))?;
    }
    if let Some(path) = &args.export_cashflows {
        crate::io::write_cashflows_csv(path, &valuation.rows)?;
    }
    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = forecast_config_from_args(&args.forecast);
    let spec = series_spec_from_args(&args);
    let exports = ExportPaths {
        json: args.export_json.clone(),
        cashflows: args.export_cashflows.clone(),
        debug_bundle: args.forecast.debug_bundle,
    };

    let assumptions = DcfAssumptions::example();
    if let Some(path) = &args.write_assumptions {
        crate::io::write_assumptions(path, &assumptions)?;
        eprintln!("Wrote example assumptions to {}", path.display());
    }

    let prices = pipeline::demo_prices(&spec, &config)?;
    let source = format!(
        "synthetic GBM (days={}, mu={}, sigma={}, seed={}) with example DCF assumptions",
        spec.n_days, spec.mu, spec.sigma, spec.seed
    );
    let run = pipeline::run_full(&prices, &assumptions, &config)?;
    print_full_run(&run, &source);
    write_exports(&run, &config, &exports)
}

fn print_full_run(run: &pipeline::RunOutput, source: &str) {
    println!("{}", crate::report::format_forecast_summary(&run.forecast, source));
    println!("{}", crate::report::format_valuation(&run.valuation));
    println!("{}", crate::report::format_recommendation(&run.recommendation));
}

fn write_exports(
    run: &pipeline::RunOutput,
    config: &ForecastConfig,
    exports: &ExportPaths,
) -> Result<(), AppError> {
    if let Some(path) = &exports.json {
        let export = RunExport::new(
            Some(&run.forecast.output),
            Some(&run.valuation),
            Some(&run.recommendation),
        );
        crate::io::write_result_json(path, &export)?;
        info!(path = %path.display(), "wrote result JSON");
    }
    if let Some(path) = &exports.cashflows {
        crate::io::write_cashflows_csv(path, &run.valuation.rows)?;
        info!(path = %path.display(), "wrote cash-flow CSV");
    }
    if exports.debug_bundle {
        report_debug_bundle(&run.forecast, config)?;
    }
    Ok(())
}

fn report_debug_bundle(run: &ForecastRun, config: &ForecastConfig) -> Result<PathBuf, AppError> {
    let path = crate::debug::write_debug_bundle(Path::new(DEBUG_DIR), run, config)?;
    eprintln!("Debug bundle written to {}", path.display());
    Ok(path)
}

/// Convert CLI flags into the plain config the pipeline runs on.
///
/// Column names are lower-cased to match the normalized CSV headers.
pub fn forecast_config_from_args(args: &ForecastArgs) -> ForecastConfig {
    ForecastConfig {
        target: args.target.trim().to_ascii_lowercase(),
        date_column: args.date_column.trim().to_ascii_lowercase(),
        tuner: TunerConfig {
            n_splits: args.folds,
            n_iter: args.trials,
            seed: args.seed,
        },
    }
}

fn series_spec_from_args(args: &DemoArgs) -> SeriesSpec {
    SeriesSpec {
        n_days: args.days,
        mu: args.mu,
        sigma: args.sigma,
        seed: args.sample_seed,
        ..SeriesSpec::default()
    }
}

/// Rewrite argv so bare flags default to the `run` subcommand.
///
/// Rules:
/// - `dsig`                          -> unchanged (clap prints usage)
/// - `dsig --csv a --assumptions b`  -> `dsig run --csv a --assumptions b`
/// - `dsig --help/--version/-h`      -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "run" | "forecast" | "dcf" | "demo");
    if is_subcommand {
        return argv;
    }

    // Verbosity flags are global; look past them for the first real token.
    let starts_with_flag = argv
        .iter()
        .skip(1)
        .find(|a| !is_verbosity_flag(a))
        .is_some_and(|tok| tok.starts_with('-'));
    if starts_with_flag {
        argv.insert(1, "run".to_string());
    }
    argv
}

fn is_verbosity_flag(arg: &str) -> bool {
    arg == "--verbose" || (arg.len() > 1 && arg.starts_with('-') && arg[1..].chars().all(|c| c == 'v'))
}
