pub mod forecast;
pub mod prepare;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use fluxcast_core::config::PipelineConfig;
use fluxcast_core::pipeline::{prepare, PreparedData};
use fluxcast_parser::load_observations;
use tracing::info;

/// Input and configuration flags shared by every subcommand.
#[derive(Args, Debug)]
pub struct PipelineArgs {
    /// Delimited file with a header row
    #[arg(short, long)]
    pub input: PathBuf,

    /// TOML pipeline configuration
    #[arg(short, long, env = "FLUXCAST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Name of the time column
    #[arg(long)]
    pub time_column: Option<String>,

    /// Name of the flux column
    #[arg(long)]
    pub flux_column: Option<String>,

    /// Rows in the trailing rolling window
    #[arg(long)]
    pub rolling_window: Option<usize>,

    /// Rows in each input window
    #[arg(long)]
    pub input_size: Option<usize>,

    /// Future flux values predicted per example
    #[arg(long)]
    pub output_size: Option<usize>,

    /// Fraction used to place the train/test boundary
    #[arg(long)]
    pub train_fraction: Option<f64>,
}

impl PipelineArgs {
    /// Reads the config file (or defaults) and applies flag overrides on top.
    pub fn resolve_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => PipelineConfig::default(),
        };

        if let Some(column) = &self.time_column {
            config.input.time_column = column.clone();
        }
        if let Some(column) = &self.flux_column {
            config.input.flux_column = column.clone();
        }
        if let Some(window) = self.rolling_window {
            config.features.rolling_window = window;
        }
        if let Some(size) = self.input_size {
            config.windowing.input_size = size;
        }
        if let Some(size) = self.output_size {
            config.windowing.output_size = size;
        }
        if let Some(fraction) = self.train_fraction {
            config.split.train_fraction = fraction;
        }

        config.validate().context("invalid pipeline configuration")?;
        Ok(config)
    }

    pub fn run_pipeline(&self, config: &PipelineConfig) -> Result<PreparedData> {
        let observations = load_observations(&self.input, &config.input)
            .with_context(|| format!("failed to read {}", self.input.display()))?;
        info!(
            path = %self.input.display(),
            rows = observations.len(),
            "Read input"
        );
        prepare(&observations, config).context("pipeline failed")
    }
}
