use crate::error::{PipelineError, Result};

pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    if actual.len() != predicted.len() {
        return Err(PipelineError::InvalidConfig(format!(
            "cannot score {} predictions against {} actual values",
            predicted.len(),
            actual.len()
        )));
    }
    if actual.is_empty() {
        return Err(PipelineError::InvalidConfig(
            "cannot score an empty prediction set".to_string(),
        ));
    }

    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    Ok(sum / actual.len() as f64)
}

pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    mean_squared_error(actual, predicted).map(f64::sqrt)
}
