// crates/fluxcast-core/src/error.rs

use fluxcast_parser::ParserError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{stage} needs at least {required} rows but only {available} are available")]
    DataInsufficient {
        stage: &'static str,
        required: usize,
        available: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("LOESS smoothing failed: {0}")]
    Lowess(#[from] lowess::prelude::LowessError),

    #[error("Input error: {0}")]
    Parser(#[from] ParserError),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl PipelineError {
    pub(crate) fn insufficient(stage: &'static str, required: usize, available: usize) -> Self {
        PipelineError::DataInsufficient {
            stage,
            required,
            available,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
