use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context, Result};
use comfy_table::{presets::UTF8_FULL, Table};
use fluxcast_core::pipeline::{Evaluation, PipelineSummary};
use fluxcast_core::types::FeatureTable;
use polars::prelude::*;
use serde::Serialize;
use tracing::info;

pub fn stage_table(summary: &PipelineSummary) -> Table {
    let cleaning = &summary.cleaning;
    let shape = &summary.shape;
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Stage", "Rows", "Notes"]);
    table.add_row(vec![
        "load".to_string(),
        cleaning.input_rows.to_string(),
        String::new(),
    ]);
    table.add_row(vec![
        "clean".to_string(),
        cleaning.retained.to_string(),
        format!(
            "{} duplicate timestamps, {} non-positive flux",
            cleaning.duplicate_timestamps, cleaning.non_positive_flux
        ),
    ]);
    table.add_row(vec![
        "smooth".to_string(),
        summary.smoothed_rows.to_string(),
        String::new(),
    ]);
    table.add_row(vec![
        "features".to_string(),
        summary.feature_rows.to_string(),
        "time, flux, rolling_mean, rolling_std".to_string(),
    ]);
    table.add_row(vec![
        "windows".to_string(),
        summary.examples.to_string(),
        format!(
            "X ({}, {}), y ({})",
            shape.input_size, shape.num_columns, shape.output_size
        ),
    ]);
    table.add_row(vec![
        "split".to_string(),
        format!("{} / {}", summary.split.train.len(), summary.split.test.len()),
        format!("train / test at split index {}", summary.split.split_index),
    ]);
    table
}

pub fn evaluation_table(evaluation: &Evaluation) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Metric", "Scaled", "Flux units"]);

    let epochs = evaluation.fit.epochs.len();
    let best = evaluation
        .fit
        .best_epoch
        .map_or_else(|| "-".to_string(), |epoch| epoch.to_string());
    table.add_row(vec![
        format!("{} epochs", evaluation.model),
        epochs.to_string(),
        format!("best {best}{}", if evaluation.fit.stopped_early { ", stopped early" } else { "" }),
    ]);

    match &evaluation.test_mse {
        Some(mse) => table.add_row(vec![
            format!("test MSE ({} examples)", evaluation.test_examples),
            format!("{:.6}", mse.scaled),
            format!("{:.6}", mse.flux),
        ]),
        None => table.add_row(vec!["test MSE", "-", "empty test range"]),
    };
    if let Some(recursive) = &evaluation.recursive {
        table.add_row(vec![
            format!("recursive RMSE ({} steps)", recursive.horizon),
            format!("{:.6}", recursive.rmse.scaled),
            format!("{:.6}", recursive.rmse.flux),
        ]);
    }
    table
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create report {}", path.display()))?;
    serde_json::to_writer_pretty(file, value)
        .with_context(|| format!("failed to write report {}", path.display()))?;
    info!(path = %path.display(), "Wrote JSON report");
    Ok(())
}

/// Writes the table as CSV or Parquet, chosen by the file extension.
pub fn export_table(table: &FeatureTable, path: &Path) -> Result<()> {
    let mut df = table.to_dataframe().context("failed to build export frame")?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("csv") => {
            let mut file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            CsvWriter::new(&mut file)
                .finish(&mut df)
                .context("failed to write CSV export")?;
        }
        Some("parquet") => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            ParquetWriter::new(file)
                .finish(&mut df)
                .context("failed to write parquet export")?;
        }
        _ => bail!(
            "cannot infer export format for {}; use a .csv or .parquet extension",
            path.display()
        ),
    }

    info!(path = %path.display(), rows = df.height(), "Exported scaled features");
    Ok(())
}
