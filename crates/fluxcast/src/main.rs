// crates/fluxcast/src/main.rs

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod report;

use commands::forecast::{handle_forecast, ForecastArgs};
use commands::prepare::{handle_prepare, PrepareArgs};

/// Prepare flux light curves and fit forecasting models to them
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean, smooth, featurize, scale, window and split a light curve
    Prepare(PrepareArgs),
    /// Run the preparation stages, then fit and score a forecaster
    Forecast(ForecastArgs),
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Prepare(args) => handle_prepare(args),
        Command::Forecast(args) => handle_forecast(args),
    }
}
