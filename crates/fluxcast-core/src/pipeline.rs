//! Runs the preparation stages in order and scores a forecaster on the result.

use serde::Serialize;
use tracing::{info, warn};

use crate::cleaning::{clean_observations, CleanReport};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::features::{apply_feature_masks, build_features};
use crate::forecast::{
    mean_squared_error, recursive_forecast, root_mean_squared_error, FitOptions, FitReport,
    Forecaster,
};
use crate::scaling::{fit_scale, fit_scale_rows, ScalerFitScope, ScalerState};
use crate::smoothing::smooth;
use crate::splitting::{split_counts, validation_split, DatasetSplit};
use crate::types::{FeatureColumn, FeatureTable, SmoothedSeries};
use crate::windowing::{build_windows, example_count, WindowShape, WindowedDataset};
use fluxcast_parser::Observation;

/// Output of every preparation stage, kept for inspection and export.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub clean_report: CleanReport,
    pub smoothed: SmoothedSeries,
    pub features: FeatureTable,
    pub scaled: FeatureTable,
    pub scaler: ScalerState,
    pub dataset: WindowedDataset,
    pub split: DatasetSplit,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
    pub cleaning: CleanReport,
    pub smoothed_rows: usize,
    pub feature_rows: usize,
    pub examples: usize,
    pub shape: WindowShape,
    pub split: DatasetSplit,
    pub scaler: ScalerState,
}

impl PreparedData {
    pub fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            cleaning: self.clean_report,
            smoothed_rows: self.smoothed.len(),
            feature_rows: self.features.len(),
            examples: self.dataset.len(),
            shape: self.dataset.shape(),
            split: self.split.clone(),
            scaler: self.scaler.clone(),
        }
    }
}

/// Cleans, smooths, adds rolling features, scales, windows and splits `observations`.
pub fn prepare(observations: &[Observation], config: &PipelineConfig) -> Result<PreparedData> {
    config.validate()?;

    let cleaned = clean_observations(observations);
    let smoothed = smooth(&cleaned.observations, &config.smoothing)?;
    let features = build_features(
        &smoothed,
        config.features.rolling_window,
        config.features.warmup,
    )?;

    let windowing = config.windowing;
    let examples = example_count(features.len(), windowing.input_size, windowing.output_size)?;
    let split = split_counts(examples, features.len(), &config.split)?;

    let scaler = match config.scaling.fit_scope {
        ScalerFitScope::FullTable => fit_scale(&features)?,
        ScalerFitScope::TrainingRows => {
            // Rows read by the last training example, targets included.
            let rows = (split.train.end - 1 + windowing.input_size + windowing.output_size)
                .min(features.len());
            fit_scale_rows(&features, rows)?
        }
    };
    let scaled = scaler.transform(&features);

    let mut dataset = build_windows(&scaled, windowing.input_size, windowing.output_size)?;
    apply_feature_masks(&mut dataset, &config.features.masks)?;

    info!(
        examples = dataset.len(),
        train = split.train.len(),
        test = split.test.len(),
        "Prepared supervised dataset"
    );

    Ok(PreparedData {
        clean_report: cleaned.report,
        smoothed,
        features,
        scaled,
        scaler,
        dataset,
        split,
    })
}

/// Error of a scored prediction set, on the scaled axis and in flux units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Score {
    pub scaled: f64,
    pub flux: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecursiveEvaluation {
    pub horizon: usize,
    pub forecasts: Vec<f64>,
    pub actual: Vec<f64>,
    pub rmse: Score,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub model: String,
    pub fit: FitReport,
    pub test_examples: usize,
    pub test_mse: Option<Score>,
    pub recursive: Option<RecursiveEvaluation>,
}

/// Fits `model` on the training range (with a validation hold-out), then scores one-step
/// predictions and a `horizon`-step recursive forecast on the test range.
///
/// Forecasts and actual values in the returned [`RecursiveEvaluation`] are in flux units.
pub fn evaluate<F>(
    prepared: &PreparedData,
    model: &mut F,
    config: &PipelineConfig,
    horizon: usize,
) -> Result<Evaluation>
where
    F: Forecaster + ?Sized,
{
    let dataset = &prepared.dataset;
    let held_out = validation_split(
        prepared.split.train.clone(),
        config.validation.fraction,
        config.validation.strategy,
    )?;

    let x_train = dataset.inputs(held_out.train.iter().copied());
    let y_train = dataset.target_rows(held_out.train.iter().copied());
    let x_val = dataset.inputs(held_out.validation.iter().copied());
    let y_val = dataset.target_rows(held_out.validation.iter().copied());
    let options = FitOptions::new(config.training).with_validation(&x_val, &y_val);
    let fit = model.fit(&x_train, &y_train, &options)?;

    let test = prepared.split.test.clone();
    if test.is_empty() {
        warn!(
            split_index = prepared.split.split_index,
            examples = dataset.len(),
            "Test range is empty; only the fit is reported"
        );
        return Ok(Evaluation {
            model: model.name().to_string(),
            fit,
            test_examples: 0,
            test_mse: None,
            recursive: None,
        });
    }

    let x_test = dataset.inputs(test.clone());
    let y_test = dataset.target_rows(test.clone());
    let predicted = model.predict(&x_test)?;
    let test_mse = score(
        &prepared.scaler,
        y_test.values(),
        predicted.values(),
        mean_squared_error,
    )?;

    let recursive = if horizon == 0 {
        None
    } else {
        let steps = horizon.min(test.len());
        let seed = dataset.features(test.start);
        let forecasts = recursive_forecast(&*model, &seed, dataset.shape(), steps)?;
        let actual: Vec<f64> = (test.start..test.start + steps)
            .map(|i| dataset.targets(i)[0])
            .collect();
        let rmse = score(&prepared.scaler, &actual, &forecasts, root_mean_squared_error)?;
        let flux = FeatureColumn::Flux;
        Some(RecursiveEvaluation {
            horizon: steps,
            forecasts: prepared.scaler.inverse_column(flux, &forecasts),
            actual: prepared.scaler.inverse_column(flux, &actual),
            rmse,
        })
    };

    info!(
        model = model.name(),
        test_examples = test.len(),
        test_mse = test_mse.flux,
        "Evaluated forecaster"
    );

    Ok(Evaluation {
        model: model.name().to_string(),
        fit,
        test_examples: test.len(),
        test_mse: Some(test_mse),
        recursive,
    })
}

fn score(
    scaler: &ScalerState,
    actual: &[f64],
    predicted: &[f64],
    metric: fn(&[f64], &[f64]) -> Result<f64>,
) -> Result<Score> {
    let flux = FeatureColumn::Flux;
    Ok(Score {
        scaled: metric(actual, predicted)?,
        flux: metric(
            &scaler.inverse_column(flux, actual),
            &scaler.inverse_column(flux, predicted),
        )?,
    })
}
