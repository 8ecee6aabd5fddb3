//! Model contract for the prepared windows.
//!
//! Sequence models consume `examples x input_size x num_columns` windows; flat models
//! consume the same windows flattened to `examples x (input_size * num_columns)`.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::windowing::WindowShape;

mod linear;
mod metrics;
mod persistence;
mod recursive;

pub use linear::LinearForecaster;
pub use metrics::{mean_squared_error, root_mean_squared_error};
pub use persistence::PersistenceForecaster;
pub use recursive::recursive_forecast;

/// 3D model input. Each window is `input_size * num_columns` values, row-major.
#[derive(Debug, Clone)]
pub struct SequenceInput<'a> {
    shape: WindowShape,
    windows: Vec<Cow<'a, [f64]>>,
}

impl<'a> SequenceInput<'a> {
    pub fn new(shape: WindowShape, windows: Vec<Cow<'a, [f64]>>) -> Self {
        debug_assert!(windows.iter().all(|w| w.len() == shape.input_width()));
        Self { shape, windows }
    }

    pub fn shape(&self) -> WindowShape {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn window(&self, i: usize) -> &[f64] {
        &self.windows[i]
    }

    /// Row `row` of window `i`.
    pub fn step(&self, i: usize, row: usize) -> &[f64] {
        let cols = self.shape.num_columns;
        &self.windows[i][row * cols..(row + 1) * cols]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.windows.iter().map(|w| w.as_ref())
    }
}

/// 2D model input: one flattened window per row.
#[derive(Debug, Clone)]
pub struct FlatInput<'a> {
    width: usize,
    rows: Vec<Cow<'a, [f64]>>,
}

impl FlatInput<'_> {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.rows[i]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.rows.iter().map(|r| r.as_ref())
    }
}

/// Reshapes windows into rows of `input_size * num_columns` features without copying.
pub fn flatten<'a>(input: &'a SequenceInput<'_>) -> FlatInput<'a> {
    FlatInput {
        width: input.shape.input_width(),
        rows: input.windows.iter().map(|w| Cow::Borrowed(w.as_ref())).collect(),
    }
}

/// Row-major `examples x width` target or prediction matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Targets {
    width: usize,
    values: Vec<f64>,
}

impl Targets {
    /// # Panics
    /// If `width` is zero or does not divide `values.len()`.
    pub fn new(width: usize, values: Vec<f64>) -> Self {
        assert!(width > 0, "targets need at least one value per row");
        assert!(
            values.len() % width == 0,
            "{} values do not fill rows of width {width}",
            values.len()
        );
        Self { width, values }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.values.len() / self.width
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.width..(i + 1) * self.width]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Values of output step `step` across all examples.
    pub fn column(&self, step: usize) -> Vec<f64> {
        self.values
            .chunks(self.width)
            .map(|row| row[step])
            .collect()
    }
}

/// Epoch and regularisation settings shared by the bundled collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub l2: f64,
    /// Stop after this many epochs without a validation improvement.
    pub patience: Option<usize>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 30,
            learning_rate: 0.1,
            l2: 1e-6,
            patience: Some(5),
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(PipelineError::InvalidConfig(
                "training needs at least one epoch".to_string(),
            ));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.l2.is_finite() && self.l2 >= 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "l2 must be non-negative, got {}",
                self.l2
            )));
        }
        if self.patience == Some(0) {
            return Err(PipelineError::InvalidConfig(
                "patience must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}

pub struct FitOptions<'a, X> {
    pub training: TrainingConfig,
    pub validation: Option<(&'a X, &'a Targets)>,
}

impl<X> FitOptions<'_, X> {
    pub fn new(training: TrainingConfig) -> Self {
        Self {
            training,
            validation: None,
        }
    }
}

impl<'a, X> FitOptions<'a, X> {
    pub fn with_validation(mut self, x: &'a X, y: &'a Targets) -> Self {
        self.validation = Some((x, y));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EpochLoss {
    pub epoch: usize,
    pub train_mse: f64,
    pub validation_mse: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FitReport {
    pub epochs: Vec<EpochLoss>,
    pub best_epoch: Option<usize>,
    pub stopped_early: bool,
}

/// Model over 3D windows.
pub trait Forecaster {
    fn name(&self) -> &str;

    fn fit(
        &mut self,
        x: &SequenceInput<'_>,
        y: &Targets,
        options: &FitOptions<'_, SequenceInput<'_>>,
    ) -> Result<FitReport>;

    fn predict(&self, x: &SequenceInput<'_>) -> Result<Targets>;
}

/// Model over flattened 2D windows.
pub trait FlatForecaster {
    fn name(&self) -> &str;

    fn fit(
        &mut self,
        x: &FlatInput<'_>,
        y: &Targets,
        options: &FitOptions<'_, FlatInput<'_>>,
    ) -> Result<FitReport>;

    fn predict(&self, x: &FlatInput<'_>) -> Result<Targets>;
}

/// Runs a [`FlatForecaster`] wherever a [`Forecaster`] is expected.
#[derive(Debug, Clone, Default)]
pub struct Flattened<F>(pub F);

impl<F: FlatForecaster> Forecaster for Flattened<F> {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn fit(
        &mut self,
        x: &SequenceInput<'_>,
        y: &Targets,
        options: &FitOptions<'_, SequenceInput<'_>>,
    ) -> Result<FitReport> {
        let flat = flatten(x);
        let validation = options.validation.map(|(vx, vy)| (flatten(vx), vy));
        let flat_options = FitOptions {
            training: options.training,
            validation: validation.as_ref().map(|(vx, vy)| (vx, *vy)),
        };
        self.0.fit(&flat, y, &flat_options)
    }

    fn predict(&self, x: &SequenceInput<'_>) -> Result<Targets> {
        self.0.predict(&flatten(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape() -> WindowShape {
        WindowShape {
            input_size: 2,
            output_size: 1,
            num_columns: 3,
        }
    }

    #[test]
    fn flatten_keeps_row_major_order() {
        let input = SequenceInput::new(
            shape(),
            vec![
                Cow::Owned(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
                Cow::Owned(vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0]),
            ],
        );
        assert_eq!(input.step(1, 1), &[10.0, 11.0, 12.0]);

        let flat = flatten(&input);
        assert_eq!(flat.width(), 6);
        assert_eq!(flat.len(), 2);
        assert_eq!(flat.row(1), &[7.0, 8.0, 9.0, 10.0, 11.0, 12.0]);
    }

    #[test]
    fn targets_expose_rows_and_steps() {
        let targets = Targets::new(2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(targets.len(), 3);
        assert_eq!(targets.row(2), &[5.0, 6.0]);
        assert_eq!(targets.column(1), vec![2.0, 4.0, 6.0]);
    }

    #[test]
    #[should_panic(expected = "at least one value per row")]
    fn zero_width_targets_are_rejected() {
        Targets::new(0, Vec::new());
    }
}
