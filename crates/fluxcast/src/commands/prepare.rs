use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use super::PipelineArgs;
use crate::report::{export_table, stage_table, write_json};

#[derive(Args, Debug)]
pub struct PrepareArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Write the scaled feature table to a .csv or .parquet file
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Write the stage summary as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,
}

pub fn handle_prepare(args: PrepareArgs) -> Result<()> {
    let config = args.pipeline.resolve_config()?;
    let prepared = args.pipeline.run_pipeline(&config)?;
    let summary = prepared.summary();

    println!("{}", stage_table(&summary));

    if let Some(path) = &args.export {
        export_table(&prepared.scaled, path)?;
        println!("Scaled features written to {}", path.display());
    }
    if let Some(path) = &args.report {
        write_json(path, &summary)?;
    }
    Ok(())
}
