use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::features::{FeatureMask, WarmupPolicy};
use crate::forecast::TrainingConfig;
use crate::scaling::ScalerFitScope;
use crate::smoothing::LoessConfig;
use crate::splitting::{SplitConfig, ValidationStrategy};
use fluxcast_parser::ColumnSpec;

/// Every tunable of a run. All sections are optional in the TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub input: ColumnSpec,
    pub smoothing: LoessConfig,
    pub features: FeatureConfig,
    pub scaling: ScalingConfig,
    pub windowing: WindowConfig,
    pub split: SplitConfig,
    pub validation: ValidationConfig,
    pub training: TrainingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub rolling_window: usize,
    pub warmup: WarmupPolicy,
    pub masks: Vec<FeatureMask>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            rolling_window: 2000,
            warmup: WarmupPolicy::default(),
            masks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingConfig {
    pub fit_scope: ScalerFitScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub input_size: usize,
    pub output_size: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            input_size: 400,
            output_size: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub fraction: f64,
    pub strategy: ValidationStrategy,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            fraction: 0.2,
            strategy: ValidationStrategy::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), "Loaded pipeline configuration");
        Ok(config)
    }

    /// Checks the settings that can be judged without data.
    pub fn validate(&self) -> Result<()> {
        self.smoothing.validate()?;
        if self.features.rolling_window < 2 {
            return Err(PipelineError::InvalidConfig(format!(
                "features.rolling_window must be at least 2, got {}",
                self.features.rolling_window
            )));
        }
        if self.windowing.input_size == 0 || self.windowing.output_size == 0 {
            return Err(PipelineError::InvalidConfig(
                "windowing.input_size and windowing.output_size must be at least 1".to_string(),
            ));
        }
        self.split.validate()?;
        if !(self.validation.fraction > 0.0 && self.validation.fraction < 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "validation.fraction must lie strictly between 0 and 1, got {}",
                self.validation.fraction
            )));
        }
        self.training.validate()
    }
}
