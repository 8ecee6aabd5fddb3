use std::io::Cursor;
use std::path::Path;

use polars::prelude::*;
use tracing::debug;

use crate::errors::ParserError;
use crate::model::{ColumnSpec, Observation};

/// Reads a delimited table from disk and extracts its (time, flux) observations.
pub fn load_observations(path: &Path, spec: &ColumnSpec) -> Result<Vec<Observation>, ParserError> {
    let content = std::fs::read(path).map_err(|source| ParserError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let observations = parse_observations(&content, spec)?;
    debug!(
        path = %path.display(),
        rows = observations.len(),
        "Loaded observations"
    );
    Ok(observations)
}

/// Parses CSV content with a header row. Every column is read as text so that a bad cell
/// is reported with its row rather than failing schema inference.
pub fn parse_observations(content: &[u8], spec: &ColumnSpec) -> Result<Vec<Observation>, ParserError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(content))
        .finish()?;

    observations_from_frame(&df, spec)
}

/// Extracts observations from an already materialized frame.
pub fn observations_from_frame(
    df: &DataFrame,
    spec: &ColumnSpec,
) -> Result<Vec<Observation>, ParserError> {
    let times = numeric_column(df, &spec.time_column)?;
    let fluxes = numeric_column(df, &spec.flux_column)?;

    Ok(times
        .into_iter()
        .zip(fluxes)
        .map(|(time, flux)| Observation::new(time, flux))
        .collect())
}

fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<f64>, ParserError> {
    let column = df.column(name).map_err(|_| ParserError::MissingColumn {
        column: name.to_string(),
        available: df
            .get_column_names()
            .iter()
            .map(|column| column.to_string())
            .collect(),
    })?;

    let dtype = column.dtype().clone();
    if dtype == DataType::String {
        let values = column.str()?;
        values
            .into_iter()
            .enumerate()
            .map(|(idx, raw)| parse_cell(name, idx, raw))
            .collect()
    } else if dtype.is_float() || dtype.is_integer() {
        let cast = column.cast(&DataType::Float64)?;
        let values = cast.f64()?;
        values
            .into_iter()
            .enumerate()
            .map(|(idx, value)| match value {
                Some(value) => finite(name, idx, value),
                None => Err(ParserError::malformed(name, idx, "empty value")),
            })
            .collect()
    } else {
        Err(ParserError::malformed(
            name,
            0,
            format!("column has non-numeric type {dtype}"),
        ))
    }
}

fn parse_cell(column: &str, idx: usize, raw: Option<&str>) -> Result<f64, ParserError> {
    let Some(raw) = raw else {
        return Err(ParserError::malformed(column, idx, "empty value"));
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParserError::malformed(column, idx, "empty value"));
    }

    let value = trimmed
        .parse::<f64>()
        .map_err(|_| ParserError::malformed(column, idx, format!("'{trimmed}' is not a number")))?;
    finite(column, idx, value)
}

fn finite(column: &str, idx: usize, value: f64) -> Result<f64, ParserError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParserError::malformed(
            column,
            idx,
            format!("{value} is not a finite number"),
        ))
    }
}
