use serde::{Deserialize, Serialize};

/// A single (time, flux) measurement as read from the input table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub time: f64,
    pub flux: f64,
}

impl Observation {
    pub fn new(time: f64, flux: f64) -> Self {
        Self { time, flux }
    }
}

/// Names of the columns holding the time-like and flux-like values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSpec {
    pub time_column: String,
    pub flux_column: String,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            time_column: "mjd".to_string(),
            flux_column: "flux".to_string(),
        }
    }
}

impl ColumnSpec {
    pub fn new(time_column: impl Into<String>, flux_column: impl Into<String>) -> Self {
        Self {
            time_column: time_column.into(),
            flux_column: flux_column.into(),
        }
    }
}
