//! LOESS smoothing of the cleaned flux series.
//!
//! Each point is replaced by the value of a tri-cube weighted linear regression over its
//! `frac * n` nearest neighbours in time, followed by bisquare robustness passes. The
//! options mirror statsmodels' `lowess`: no boundary padding, residual scale taken as the
//! median absolute residual, and an explicit `delta` (0 fits every point).

use fluxcast_parser::Observation;
use lowess::prelude::{Batch, Bisquare, Lowess, NoBoundary, Tricube, MAR};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::types::SmoothedSeries;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoessConfig {
    /// Fraction of the data used for each local fit.
    pub frac: f64,
    /// Number of robustness re-weighting passes after the initial fit.
    pub iterations: usize,
    /// Distance in time within which points are interpolated rather than fitted.
    pub delta: f64,
}

impl Default for LoessConfig {
    fn default() -> Self {
        Self {
            frac: 0.002,
            iterations: 3,
            delta: 0.0,
        }
    }
}

impl LoessConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.frac > 0.0 && self.frac <= 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "LOESS frac must be in (0, 1], got {}",
                self.frac
            )));
        }
        if !(self.delta.is_finite() && self.delta >= 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "LOESS delta must be finite and non-negative, got {}",
                self.delta
            )));
        }
        Ok(())
    }
}

/// Smooths `observations`, returning one (time, flux) pair per input sorted by time.
pub fn smooth(observations: &[Observation], config: &LoessConfig) -> Result<SmoothedSeries> {
    config.validate()?;

    let mut sorted = observations.to_vec();
    sorted.sort_by(|a, b| a.time.total_cmp(&b.time));
    let time: Vec<f64> = sorted.iter().map(|observation| observation.time).collect();
    let flux: Vec<f64> = sorted.iter().map(|observation| observation.flux).collect();

    if time.len() < 2 {
        return Ok(SmoothedSeries { time, flux });
    }

    debug!(
        points = time.len(),
        frac = config.frac,
        iterations = config.iterations,
        "Running LOESS"
    );
    let model = Lowess::new()
        .fraction(config.frac)
        .iterations(config.iterations)
        .delta(config.delta)
        .weight_function(Tricube)
        .robustness_method(Bisquare)
        .scaling_method(MAR)
        .boundary_policy(NoBoundary)
        .adapter(Batch)
        .build()?;
    let result = model.fit(&time, &flux)?;

    info!(points = time.len(), "Smoothed flux series");
    Ok(SmoothedSeries {
        time,
        flux: result.y,
    })
}
