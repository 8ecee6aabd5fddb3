use std::borrow::Cow;

use tracing::debug;

use super::{Forecaster, SequenceInput};
use crate::error::{PipelineError, Result};
use crate::types::FeatureColumn;
use crate::windowing::WindowShape;

/// Forecasts `horizon` steps by feeding each one-step prediction back into the window.
///
/// Every step drops the oldest row of the buffer and appends a copy of the newest row with
/// its flux replaced by the prediction. Only the first output step of each prediction is used.
pub fn recursive_forecast<F>(
    model: &F,
    seed: &[f64],
    shape: WindowShape,
    horizon: usize,
) -> Result<Vec<f64>>
where
    F: Forecaster + ?Sized,
{
    if shape.input_size == 0 || seed.len() != shape.input_width() {
        return Err(PipelineError::InvalidConfig(format!(
            "seed window has {} values, expected {}",
            seed.len(),
            shape.input_width()
        )));
    }

    let cols = shape.num_columns;
    let last = (shape.input_size - 1) * cols;
    let mut buffer = seed.to_vec();
    let mut forecasts = Vec::with_capacity(horizon);

    for step in 0..horizon {
        let predicted = {
            let input = SequenceInput::new(shape, vec![Cow::Borrowed(buffer.as_slice())]);
            model.predict(&input)?
        };
        let next = predicted.values().first().copied().ok_or_else(|| {
            PipelineError::InvalidConfig(format!("{} returned no prediction", model.name()))
        })?;
        forecasts.push(next);

        buffer.rotate_left(cols);
        if shape.input_size > 1 {
            buffer.copy_within(last - cols..last, last);
        }
        buffer[last + FeatureColumn::Flux.index()] = next;
        debug!(step, value = next, "Recursive forecast step");
    }

    Ok(forecasts)
}
