use polars::prelude::{DataFrame, NamedFrom, PolarsResult, Series};
use serde::{Deserialize, Serialize};

/// Columns of a [`FeatureTable`], in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureColumn {
    Time,
    Flux,
    RollingMean,
    RollingStd,
}

impl FeatureColumn {
    pub const ALL: [FeatureColumn; 4] = [
        FeatureColumn::Time,
        FeatureColumn::Flux,
        FeatureColumn::RollingMean,
        FeatureColumn::RollingStd,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        match self {
            FeatureColumn::Time => 0,
            FeatureColumn::Flux => 1,
            FeatureColumn::RollingMean => 2,
            FeatureColumn::RollingStd => 3,
        }
    }

    pub fn canonical_name(self) -> &'static str {
        match self {
            FeatureColumn::Time => "time",
            FeatureColumn::Flux => "flux",
            FeatureColumn::RollingMean => "rolling_mean",
            FeatureColumn::RollingStd => "rolling_std",
        }
    }
}

/// LOESS output: time-ordered (time, flux) pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SmoothedSeries {
    pub time: Vec<f64>,
    pub flux: Vec<f64>,
}

impl SmoothedSeries {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.time.iter().copied().zip(self.flux.iter().copied())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub time: f64,
    pub flux: f64,
    pub rolling_mean: f64,
    pub rolling_std: f64,
}

impl FeatureRow {
    pub fn get(&self, column: FeatureColumn) -> f64 {
        match column {
            FeatureColumn::Time => self.time,
            FeatureColumn::Flux => self.flux,
            FeatureColumn::RollingMean => self.rolling_mean,
            FeatureColumn::RollingStd => self.rolling_std,
        }
    }

    pub fn set(&mut self, column: FeatureColumn, value: f64) {
        match column {
            FeatureColumn::Time => self.time = value,
            FeatureColumn::Flux => self.flux = value,
            FeatureColumn::RollingMean => self.rolling_mean = value,
            FeatureColumn::RollingStd => self.rolling_std = value,
        }
    }

    /// Values in [`FeatureColumn::ALL`] order.
    pub fn values(&self) -> [f64; FeatureColumn::COUNT] {
        [self.time, self.flux, self.rolling_mean, self.rolling_std]
    }
}

/// Rows of (time, flux, rolling_mean, rolling_std) with warm-up rows already removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn new(rows: Vec<FeatureRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, column: FeatureColumn) -> Vec<f64> {
        self.rows.iter().map(|row| row.get(column)).collect()
    }

    pub fn map_rows(&self, f: impl Fn(&FeatureRow) -> FeatureRow) -> FeatureTable {
        FeatureTable::new(self.rows.iter().map(f).collect())
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let columns = FeatureColumn::ALL
            .iter()
            .map(|column| Series::new(column.canonical_name().into(), self.column(*column)).into())
            .collect();
        DataFrame::new(columns)
    }
}
