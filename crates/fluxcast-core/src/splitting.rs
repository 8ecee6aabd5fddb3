use std::ops::Range;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::windowing::WindowedDataset;

/// Which row count the split index is derived from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitBoundary {
    /// `floor(fraction * feature_table_rows)`, as the reference scripts compute it.
    #[default]
    TableRows,
    /// `floor(fraction * example_count)`.
    Examples,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub train_fraction: f64,
    pub boundary: SplitBoundary,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_fraction: 0.8,
            boundary: SplitBoundary::default(),
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<()> {
        check_fraction("train_fraction", self.train_fraction)
    }
}

/// Contiguous, time-ordered train/test ranges of example indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetSplit {
    pub split_index: usize,
    pub train: Range<usize>,
    pub test: Range<usize>,
}

pub fn split_dataset(dataset: &WindowedDataset, config: &SplitConfig) -> Result<DatasetSplit> {
    split_counts(dataset.len(), dataset.table_rows(), config)
}

/// Splits `examples` example indices; `table_rows` feeds the [`SplitBoundary::TableRows`] rule.
pub fn split_counts(examples: usize, table_rows: usize, config: &SplitConfig) -> Result<DatasetSplit> {
    config.validate()?;
    let basis = match config.boundary {
        SplitBoundary::TableRows => table_rows,
        SplitBoundary::Examples => examples,
    };
    let split_index = (config.train_fraction * basis as f64).floor() as usize;
    let train_end = (split_index + 1).min(examples);

    info!(
        split_index,
        train = train_end,
        test = examples - train_end,
        "Split examples in time order"
    );

    Ok(DatasetSplit {
        split_index,
        train: 0..train_end,
        test: train_end..examples,
    })
}

/// How validation examples are carved out of the training range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationStrategy {
    /// Seeded permutation; the first `ceil(fraction * n)` shuffled indices validate.
    Shuffled { seed: u64 },
    /// The last part of the training range, unshuffled.
    Tail,
}

impl Default for ValidationStrategy {
    fn default() -> Self {
        ValidationStrategy::Shuffled { seed: 42 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationSplit {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

pub fn validation_split(
    train: Range<usize>,
    fraction: f64,
    strategy: ValidationStrategy,
) -> Result<ValidationSplit> {
    check_fraction("validation fraction", fraction)?;
    let n = train.len();
    if n < 2 {
        return Err(PipelineError::insufficient("validation split", 2, n));
    }

    let mut indices: Vec<usize> = train.collect();
    let split = match strategy {
        ValidationStrategy::Shuffled { seed } => {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            indices.shuffle(&mut rng);
            let held_out = ((fraction * n as f64).ceil() as usize).clamp(1, n - 1);
            let train = indices.split_off(held_out);
            ValidationSplit {
                train,
                validation: indices,
            }
        }
        ValidationStrategy::Tail => {
            let keep = ((n as f64 * (1.0 - fraction)) as usize).clamp(1, n - 1);
            let validation = indices.split_off(keep);
            ValidationSplit {
                train: indices,
                validation,
            }
        }
    };

    info!(
        train = split.train.len(),
        validation = split.validation.len(),
        "Carved validation examples from the training range"
    );
    Ok(split)
}

fn check_fraction(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(PipelineError::InvalidConfig(format!(
            "{name} must lie strictly between 0 and 1, got {value}"
        )))
    }
}
