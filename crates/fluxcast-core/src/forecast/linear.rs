use tracing::{debug, info};

use super::{EpochLoss, FitOptions, FitReport, FlatForecaster, FlatInput, Targets};
use crate::error::{PipelineError, Result};

/// Ridge-regularised linear model over flattened windows, one weight row per output step,
/// trained by full-batch gradient descent.
///
/// The step size is `learning_rate / (2 * mean ||x||^2)` so a learning rate of at most 1
/// keeps the descent stable regardless of the window width.
#[derive(Debug, Clone, Default)]
pub struct LinearForecaster {
    width: usize,
    output_size: usize,
    // output_size rows of width weights followed by a bias.
    weights: Vec<f64>,
}

impl LinearForecaster {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_fitted(&self) -> bool {
        !self.weights.is_empty()
    }

    fn predict_row(&self, row: &[f64], out: &mut Vec<f64>) {
        for coefficients in self.weights.chunks(self.width + 1) {
            let (w, bias) = coefficients.split_at(self.width);
            let dot: f64 = w.iter().zip(row).map(|(w, x)| w * x).sum();
            out.push(dot + bias[0]);
        }
    }

    fn mse(&self, x: &FlatInput<'_>, y: &Targets) -> f64 {
        let mut prediction = Vec::with_capacity(self.output_size);
        let mut sum = 0.0;
        for (i, row) in x.iter().enumerate() {
            prediction.clear();
            self.predict_row(row, &mut prediction);
            sum += prediction
                .iter()
                .zip(y.row(i))
                .map(|(p, t)| (p - t).powi(2))
                .sum::<f64>();
        }
        sum / (x.len() * self.output_size) as f64
    }

    fn gradient_step(&mut self, x: &FlatInput<'_>, y: &Targets, step: f64, l2: f64) {
        let stride = self.width + 1;
        let mut gradient = vec![0.0; self.weights.len()];
        let mut prediction = Vec::with_capacity(self.output_size);

        for (i, row) in x.iter().enumerate() {
            prediction.clear();
            self.predict_row(row, &mut prediction);
            for (k, (p, t)) in prediction.iter().zip(y.row(i)).enumerate() {
                let err = p - t;
                let g = &mut gradient[k * stride..(k + 1) * stride];
                for (gj, xj) in g.iter_mut().zip(row) {
                    *gj += err * xj;
                }
                g[self.width] += err;
            }
        }

        let scale = 2.0 / (x.len() * self.output_size) as f64;
        for (j, (w, g)) in self.weights.iter_mut().zip(&gradient).enumerate() {
            let penalty = if j % stride == self.width { 0.0 } else { 2.0 * l2 * *w };
            *w -= step * (scale * g + penalty);
        }
    }

    fn check_width(&self, x: &FlatInput<'_>) -> Result<()> {
        if x.width() != self.width {
            return Err(PipelineError::InvalidConfig(format!(
                "model expects {} features per row, got {}",
                self.width,
                x.width()
            )));
        }
        Ok(())
    }
}

impl FlatForecaster for LinearForecaster {
    fn name(&self) -> &str {
        "linear"
    }

    fn fit(
        &mut self,
        x: &FlatInput<'_>,
        y: &Targets,
        options: &FitOptions<'_, FlatInput<'_>>,
    ) -> Result<FitReport> {
        let training = options.training;
        training.validate()?;
        if x.is_empty() {
            return Err(PipelineError::insufficient("training", 1, 0));
        }
        if x.len() != y.len() {
            return Err(PipelineError::InvalidConfig(format!(
                "{} input rows but {} target rows",
                x.len(),
                y.len()
            )));
        }

        self.width = x.width();
        self.output_size = y.width();
        self.weights = vec![0.0; self.output_size * (self.width + 1)];
        if let Some((vx, vy)) = options.validation {
            self.check_width(vx)?;
            if vx.len() != vy.len() || vx.is_empty() {
                return Err(PipelineError::InvalidConfig(format!(
                    "validation set has {} input rows and {} target rows",
                    vx.len(),
                    vy.len()
                )));
            }
        }

        let mean_norm = x
            .iter()
            .map(|row| 1.0 + row.iter().map(|v| v * v).sum::<f64>())
            .sum::<f64>()
            / x.len() as f64;
        let step = training.learning_rate / (2.0 * mean_norm);

        let mut stopper = EarlyStopping::new(training.patience);
        let mut best_weights = self.weights.clone();
        let mut report = FitReport::default();

        for epoch in 0..training.epochs {
            self.gradient_step(x, y, step, training.l2);

            let train_mse = self.mse(x, y);
            let validation_mse = options.validation.map(|(vx, vy)| self.mse(vx, vy));
            report.epochs.push(EpochLoss {
                epoch,
                train_mse,
                validation_mse,
            });
            debug!(epoch, train_mse, ?validation_mse, "Finished epoch");

            match stopper.observe(epoch, validation_mse.unwrap_or(train_mse)) {
                Progress::Improved => best_weights.clone_from(&self.weights),
                Progress::Stalled => {}
                Progress::Exhausted => {
                    report.stopped_early = true;
                    break;
                }
            }
        }

        self.weights = best_weights;
        report.best_epoch = stopper.best_epoch;
        info!(
            epochs = report.epochs.len(),
            best_epoch = ?report.best_epoch,
            stopped_early = report.stopped_early,
            "Trained linear forecaster"
        );
        Ok(report)
    }

    fn predict(&self, x: &FlatInput<'_>) -> Result<Targets> {
        if !self.is_fitted() {
            return Err(PipelineError::InvalidConfig(
                "linear forecaster used before fit".to_string(),
            ));
        }
        self.check_width(x)?;

        let mut values = Vec::with_capacity(x.len() * self.output_size);
        for row in x.iter() {
            self.predict_row(row, &mut values);
        }
        Ok(Targets::new(self.output_size, values))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Progress {
    Improved,
    Stalled,
    Exhausted,
}

/// Tracks the best monitored loss and counts epochs since it last improved.
#[derive(Debug)]
struct EarlyStopping {
    patience: Option<usize>,
    best: f64,
    best_epoch: Option<usize>,
    stale: usize,
}

impl EarlyStopping {
    fn new(patience: Option<usize>) -> Self {
        Self {
            patience,
            best: f64::INFINITY,
            best_epoch: None,
            stale: 0,
        }
    }

    fn observe(&mut self, epoch: usize, loss: f64) -> Progress {
        if loss < self.best {
            self.best = loss;
            self.best_epoch = Some(epoch);
            self.stale = 0;
            return Progress::Improved;
        }
        self.stale += 1;
        match self.patience {
            Some(patience) if self.stale >= patience => Progress::Exhausted,
            _ => Progress::Stalled,
        }
    }
}
