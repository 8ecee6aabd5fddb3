use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{PipelineError, Result};
use crate::types::{FeatureColumn, FeatureRow, FeatureTable};

/// Which rows the min/max statistics are computed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalerFitScope {
    /// Every feature row, including rows that end up in the test partition.
    #[default]
    FullTable,
    /// Only the rows reachable from training examples.
    TrainingRows,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnRange {
    pub min: f64,
    pub max: f64,
}

impl ColumnRange {
    /// True when the span is within rounding noise of zero.
    pub fn is_constant(&self) -> bool {
        let magnitude = self.min.abs().max(self.max.abs()).max(1.0);
        self.max - self.min <= 10.0 * f64::EPSILON * magnitude
    }

    /// Maps into [0, 1]; a constant column maps to 0.
    pub fn scale(&self, value: f64) -> f64 {
        if self.is_constant() {
            return 0.0;
        }
        (value - self.min) / (self.max - self.min)
    }

    pub fn inverse(&self, scaled: f64) -> f64 {
        scaled * (self.max - self.min) + self.min
    }
}

/// Per-column min/max captured when the scaler was fitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerState {
    ranges: [ColumnRange; FeatureColumn::COUNT],
}

impl ScalerState {
    pub fn range(&self, column: FeatureColumn) -> ColumnRange {
        self.ranges[column.index()]
    }

    /// Maps every column to `(x - min) / (max - min)`.
    pub fn transform(&self, table: &FeatureTable) -> FeatureTable {
        table.map_rows(|row| self.map_row(row, ColumnRange::scale))
    }

    pub fn inverse(&self, column: FeatureColumn, scaled: f64) -> f64 {
        self.range(column).inverse(scaled)
    }

    pub fn inverse_column(&self, column: FeatureColumn, scaled: &[f64]) -> Vec<f64> {
        let range = self.range(column);
        scaled.iter().map(|value| range.inverse(*value)).collect()
    }

    pub fn inverse_table(&self, table: &FeatureTable) -> FeatureTable {
        table.map_rows(|row| self.map_row(row, ColumnRange::inverse))
    }

    fn map_row(&self, row: &FeatureRow, f: fn(&ColumnRange, f64) -> f64) -> FeatureRow {
        let mut mapped = *row;
        for column in FeatureColumn::ALL {
            mapped.set(column, f(&self.ranges[column.index()], row.get(column)));
        }
        mapped
    }
}

/// Fits min/max over the whole table.
pub fn fit_scale(table: &FeatureTable) -> Result<ScalerState> {
    warn!(
        rows = table.len(),
        "Fitting scaler on the full table; test rows influence the scaling"
    );
    fit_rows(table.rows())
}

/// Fits min/max over the first `rows` rows only.
pub fn fit_scale_rows(table: &FeatureTable, rows: usize) -> Result<ScalerState> {
    if rows > table.len() {
        return Err(PipelineError::InvalidConfig(format!(
            "cannot fit scaler on {rows} rows of a {}-row table",
            table.len()
        )));
    }
    fit_rows(&table.rows()[..rows])
}

fn fit_rows(rows: &[FeatureRow]) -> Result<ScalerState> {
    if rows.is_empty() {
        return Err(PipelineError::insufficient("scaler", 1, 0));
    }

    let mut ranges = [ColumnRange {
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
    }; FeatureColumn::COUNT];

    for row in rows {
        for (range, value) in ranges.iter_mut().zip(row.values()) {
            range.min = range.min.min(value);
            range.max = range.max.max(value);
        }
    }

    for column in FeatureColumn::ALL {
        let range = ranges[column.index()];
        if range.is_constant() {
            warn!(
                column = column.canonical_name(),
                value = range.min,
                "Column is constant; it scales to 0"
            );
        }
    }

    info!(rows = rows.len(), "Fitted min-max scaler");
    Ok(ScalerState { ranges })
}
