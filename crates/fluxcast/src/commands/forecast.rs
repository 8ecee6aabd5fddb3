use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use fluxcast_core::forecast::{Flattened, Forecaster, LinearForecaster, PersistenceForecaster};
use fluxcast_core::pipeline::evaluate;
use serde_json::json;

use super::PipelineArgs;
use crate::report::{evaluation_table, stage_table, write_json};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelKind {
    /// Repeat the last observed flux
    Persistence,
    /// Ridge-regularised linear model over flattened windows
    Linear,
}

#[derive(Args, Debug)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    #[arg(long, value_enum, default_value_t = ModelKind::Linear)]
    pub model: ModelKind,

    /// Steps of the recursive forecast scored against the test range (0 disables it)
    #[arg(long, default_value_t = 10)]
    pub horizon: usize,

    /// Training epochs, overriding the config file
    #[arg(long)]
    pub epochs: Option<usize>,

    /// Write the summary and evaluation as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,
}

pub fn handle_forecast(args: ForecastArgs) -> Result<()> {
    let mut config = args.pipeline.resolve_config()?;
    if let Some(epochs) = args.epochs {
        config.training.epochs = epochs;
        config.training.validate().context("invalid --epochs")?;
    }
    let prepared = args.pipeline.run_pipeline(&config)?;
    let summary = prepared.summary();
    println!("{}", stage_table(&summary));

    let mut model: Box<dyn Forecaster> = match args.model {
        ModelKind::Persistence => Box::new(PersistenceForecaster::new()),
        ModelKind::Linear => Box::new(Flattened(LinearForecaster::new())),
    };
    let evaluation = evaluate(&prepared, model.as_mut(), &config, args.horizon)
        .context("forecast evaluation failed")?;
    println!("{}", evaluation_table(&evaluation));

    if let Some(path) = &args.report {
        write_json(
            path,
            &json!({
                "pipeline": summary,
                "evaluation": evaluation,
            }),
        )?;
    }
    Ok(())
}
