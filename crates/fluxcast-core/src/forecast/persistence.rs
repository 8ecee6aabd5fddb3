use tracing::debug;

use super::{mean_squared_error, EpochLoss, FitOptions, FitReport, Forecaster, SequenceInput, Targets};
use crate::error::Result;
use crate::types::FeatureColumn;

/// Predicts every future step as the last observed flux of the window.
#[derive(Debug, Clone, Copy, Default)]
pub struct PersistenceForecaster {
    output_size: Option<usize>,
}

impl PersistenceForecaster {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Forecaster for PersistenceForecaster {
    fn name(&self) -> &str {
        "persistence"
    }

    fn fit(
        &mut self,
        x: &SequenceInput<'_>,
        y: &Targets,
        options: &FitOptions<'_, SequenceInput<'_>>,
    ) -> Result<FitReport> {
        self.output_size = Some(y.width());

        let train_mse = mean_squared_error(y.values(), self.predict(x)?.values())?;
        let validation_mse = match options.validation {
            Some((vx, vy)) => Some(mean_squared_error(vy.values(), self.predict(vx)?.values())?),
            None => None,
        };
        debug!(train_mse, ?validation_mse, "Scored persistence baseline");

        Ok(FitReport {
            epochs: vec![EpochLoss {
                epoch: 0,
                train_mse,
                validation_mse,
            }],
            best_epoch: Some(0),
            stopped_early: false,
        })
    }

    fn predict(&self, x: &SequenceInput<'_>) -> Result<Targets> {
        let shape = x.shape();
        let width = self.output_size.unwrap_or(shape.output_size);
        let last_row = shape.input_size - 1;

        let mut values = Vec::with_capacity(x.len() * width);
        for i in 0..x.len() {
            let last = x.step(i, last_row)[FeatureColumn::Flux.index()];
            values.extend(std::iter::repeat(last).take(width));
        }
        Ok(Targets::new(width, values))
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;
    use crate::windowing::WindowShape;

    #[test]
    fn repeats_last_flux_for_each_step() {
        let shape = WindowShape {
            input_size: 2,
            output_size: 2,
            num_columns: 4,
        };
        let x = SequenceInput::new(
            shape,
            vec![Cow::Owned(vec![0.0, 0.1, 0.0, 0.0, 1.0, 0.3, 0.0, 0.0])],
        );
        let model = PersistenceForecaster::new();
        let predicted = model.predict(&x).expect("predict");
        assert_eq!(predicted.row(0), &[0.3, 0.3]);
    }
}
