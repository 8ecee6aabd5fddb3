use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::types::{FeatureColumn, FeatureRow, FeatureTable, SmoothedSeries};
use crate::windowing::WindowedDataset;

/// Which rows to drop before the rolling statistics are defined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarmupPolicy {
    /// Drop exactly the `window - 1` rows that lack a full window.
    #[default]
    PartialWindows,
    /// Drop `window` rows, matching an `iloc[window:]` slice of the rolled frame.
    ReferenceOffset,
}

impl WarmupPolicy {
    fn dropped_rows(self, window: usize) -> usize {
        match self {
            WarmupPolicy::PartialWindows => window - 1,
            WarmupPolicy::ReferenceOffset => window,
        }
    }
}

/// Zeroes one cell of one windowed example.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureMask {
    /// Index of the windowed example.
    pub example: usize,
    /// Row offset inside the example's input window.
    pub row: usize,
    pub column: FeatureColumn,
}

/// Adds trailing rolling mean and sample standard deviation (ddof = 1) of flux over
/// `window` rows. Rows without a full window are dropped, never imputed.
pub fn build_features(
    series: &SmoothedSeries,
    window: usize,
    warmup: WarmupPolicy,
) -> Result<FeatureTable> {
    if window < 2 {
        return Err(PipelineError::InvalidConfig(format!(
            "rolling window must be at least 2, got {window}"
        )));
    }

    let dropped = warmup.dropped_rows(window);
    let required = dropped + 1;
    if series.len() < required {
        return Err(PipelineError::insufficient(
            "rolling features",
            required,
            series.len(),
        ));
    }

    let flux = &series.flux;
    let mut stats = RollingStats::default();
    let mut rows = Vec::with_capacity(series.len() - dropped);

    for (idx, (time, value)) in series.iter().enumerate() {
        stats.push(value);
        if idx >= window {
            stats.pop(flux[idx - window]);
        }
        if idx >= dropped {
            rows.push(FeatureRow {
                time,
                flux: value,
                rolling_mean: stats.mean,
                rolling_std: stats.sample_std(),
            });
        }
    }

    info!(
        input_rows = series.len(),
        window,
        output_rows = rows.len(),
        "Computed rolling features"
    );
    Ok(FeatureTable::new(rows))
}

/// Applies each mask to its example only; overlapping windows keep their own values.
pub fn apply_feature_masks(dataset: &mut WindowedDataset, masks: &[FeatureMask]) -> Result<()> {
    for mask in masks {
        dataset.mask(*mask)?;
        debug!(
            example = mask.example,
            row = mask.row,
            column = mask.column.canonical_name(),
            "Masked feature cell"
        );
    }
    Ok(())
}

/// Welford accumulator supporting removal of the oldest value.
#[derive(Debug, Default)]
struct RollingStats {
    count: usize,
    mean: f64,
    m2: f64,
}

impl RollingStats {
    fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    fn pop(&mut self, value: f64) {
        self.count -= 1;
        if self.count == 0 {
            self.mean = 0.0;
            self.m2 = 0.0;
            return;
        }
        let delta = value - self.mean;
        self.mean -= delta / self.count as f64;
        self.m2 -= delta * (value - self.mean);
        if self.m2 < 0.0 {
            self.m2 = 0.0;
        }
    }

    fn sample_std(&self) -> f64 {
        if self.count < 2 {
            return f64::NAN;
        }
        (self.m2 / (self.count - 1) as f64).sqrt()
    }
}
