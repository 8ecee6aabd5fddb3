use fluxcast_core::config::PipelineConfig;
use fluxcast_core::features::{FeatureMask, WarmupPolicy};
use fluxcast_core::forecast::{Flattened, LinearForecaster, PersistenceForecaster};
use fluxcast_core::pipeline::{evaluate, prepare};
use fluxcast_core::scaling::{fit_scale_rows, ScalerFitScope};
use fluxcast_core::splitting::{split_dataset, SplitBoundary};
use fluxcast_core::types::FeatureColumn;
use fluxcast_core::Observation;

/// Positive, trending and wavy so every rolling column varies.
fn light_curve(n: usize) -> Vec<Observation> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            Observation::new(t, 100.0 + 0.01 * t + 10.0 * (t * 0.01).sin())
        })
        .collect()
}

/// time = i, flux = i + 1: every 2000-row rolling std is the same value.
fn ramp(n: usize) -> Vec<Observation> {
    (0..n)
        .map(|i| Observation::new(i as f64, i as f64 + 1.0))
        .collect()
}

fn reference_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.features.rolling_window = 2000;
    config.windowing.input_size = 400;
    config.windowing.output_size = 1;
    config
}

fn small_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.smoothing.frac = 0.05;
    config.features.rolling_window = 20;
    config.windowing.input_size = 10;
    config.windowing.output_size = 1;
    config.split.boundary = SplitBoundary::Examples;
    config
}

#[test]
fn ramp_fixture_prepares_under_both_warmups() -> anyhow::Result<()> {
    let prepared = prepare(&ramp(3000), &reference_config())?;
    assert_eq!(prepared.features.len(), 1001);
    assert_eq!(prepared.dataset.len(), 601);
    let shape = prepared.dataset.shape();
    assert_eq!((shape.input_size, shape.num_columns, shape.output_size), (400, 4, 1));

    let scaled_std = prepared.scaled.column(FeatureColumn::RollingStd);
    assert!(scaled_std.iter().all(|v| (0.0..=1.0).contains(v)));

    let mut config = reference_config();
    config.features.warmup = WarmupPolicy::ReferenceOffset;
    let prepared = prepare(&ramp(3000), &config)?;
    assert_eq!(prepared.features.len(), 1000);
    assert_eq!(prepared.dataset.len(), 600);
    Ok(())
}

#[test]
fn reference_fixture_dimensions() -> anyhow::Result<()> {
    let prepared = prepare(&light_curve(3000), &reference_config())?;

    assert_eq!(prepared.smoothed.len(), 3000);
    assert_eq!(prepared.features.len(), 1001);
    assert_eq!(prepared.dataset.len(), 601);

    let shape = prepared.dataset.shape();
    assert_eq!((shape.input_size, shape.num_columns), (400, 4));
    assert_eq!(prepared.dataset.features(600).len(), 400 * 4);
    let targets = prepared.dataset.target_rows(0..prepared.dataset.len());
    assert_eq!((targets.len(), targets.width()), (601, 1));

    // floor(0.8 * 1001) = 800 exceeds the example count, so every example trains.
    assert_eq!(prepared.split.split_index, 800);
    assert_eq!(prepared.split.train, 0..601);
    assert!(prepared.split.test.is_empty());
    Ok(())
}

#[test]
fn reference_offset_reproduces_sliced_counts() -> anyhow::Result<()> {
    let mut config = reference_config();
    config.features.warmup = WarmupPolicy::ReferenceOffset;
    let prepared = prepare(&light_curve(3000), &config)?;

    assert_eq!(prepared.features.len(), 1000);
    assert_eq!(prepared.dataset.len(), 600);
    Ok(())
}

#[test]
fn windows_follow_the_scaled_table() -> anyhow::Result<()> {
    let prepared = prepare(&light_curve(300), &small_config())?;
    let rows = prepared.scaled.rows();
    let input = prepared.dataset.shape().input_size;

    for i in 0..prepared.dataset.len() {
        let window = prepared.dataset.features(i);
        let newest = &window[(input - 1) * FeatureColumn::COUNT..];
        assert_eq!(newest, rows[i + input - 1].values().as_slice());
        assert_eq!(prepared.dataset.targets(i), &[rows[i + input].flux]);
    }
    Ok(())
}

#[test]
fn scaled_table_inverts_to_features() -> anyhow::Result<()> {
    let prepared = prepare(&light_curve(300), &small_config())?;
    let restored = prepared.scaler.inverse_table(&prepared.scaled);

    for (original, back) in prepared.features.rows().iter().zip(restored.rows()) {
        for column in FeatureColumn::ALL {
            assert!((original.get(column) - back.get(column)).abs() < 1e-9);
        }
    }
    Ok(())
}

#[test]
fn split_is_time_ordered_and_complete() -> anyhow::Result<()> {
    let config = small_config();
    let prepared = prepare(&light_curve(300), &config)?;
    let split = &prepared.split;
    assert_eq!(split, &split_dataset(&prepared.dataset, &config.split)?);

    assert_eq!(split.train.start, 0);
    assert_eq!(split.train.end, split.test.start);
    assert_eq!(split.test.end, prepared.dataset.len());
    assert!(split.test.clone().all(|i| i > split.split_index));
    Ok(())
}

#[test]
fn training_scope_fits_scaler_on_covered_rows() -> anyhow::Result<()> {
    let mut config = small_config();
    config.scaling.fit_scope = ScalerFitScope::TrainingRows;
    let prepared = prepare(&light_curve(300), &config)?;

    let covered = prepared.split.train.end - 1 + 10 + 1;
    assert_eq!(prepared.scaler, fit_scale_rows(&prepared.features, covered)?);
    Ok(())
}

#[test]
fn configured_mask_zeroes_one_example() -> anyhow::Result<()> {
    let mut config = small_config();
    config.features.masks = vec![FeatureMask {
        example: 0,
        row: 0,
        column: FeatureColumn::RollingMean,
    }];
    let prepared = prepare(&light_curve(300), &config)?;

    assert_eq!(prepared.dataset.features(0)[FeatureColumn::RollingMean.index()], 0.0);
    assert_eq!(
        prepared.dataset.features(0)[FeatureColumn::Flux.index()],
        prepared.scaled.rows()[0].flux
    );
    Ok(())
}

#[test]
fn too_short_series_fails_in_feature_stage() {
    let err = prepare(&light_curve(15), &small_config()).expect_err("short series");
    assert!(err.to_string().contains("rolling features"));
}

#[test]
fn persistence_evaluation_reports_flat_recursive_forecast() -> anyhow::Result<()> {
    let config = small_config();
    let prepared = prepare(&light_curve(300), &config)?;
    let mut model = PersistenceForecaster::new();

    let evaluation = evaluate(&prepared, &mut model, &config, 5)?;
    assert_eq!(evaluation.model, "persistence");
    assert_eq!(evaluation.test_examples, prepared.split.test.len());

    let mse = evaluation.test_mse.expect("test range is not empty");
    assert!(mse.scaled.is_finite() && mse.flux.is_finite());

    let recursive = evaluation.recursive.expect("horizon requested");
    assert_eq!(recursive.horizon, 5);
    let first = recursive.forecasts[0];
    assert!(recursive.forecasts.iter().all(|v| (v - first).abs() < 1e-9));
    Ok(())
}

#[test]
fn linear_evaluation_tracks_validation_loss() -> anyhow::Result<()> {
    let config = small_config();
    let prepared = prepare(&light_curve(300), &config)?;
    let mut model = Flattened(LinearForecaster::new());

    let evaluation = evaluate(&prepared, &mut model, &config, 3)?;
    assert_eq!(evaluation.model, "linear");
    assert!(!evaluation.fit.epochs.is_empty());
    assert!(evaluation
        .fit
        .epochs
        .iter()
        .all(|epoch| epoch.validation_mse.is_some()));
    assert_eq!(evaluation.recursive.map(|r| r.forecasts.len()), Some(3));
    Ok(())
}
