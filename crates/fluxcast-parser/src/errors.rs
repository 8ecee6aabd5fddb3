use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("input table has no column named '{column}' (found: {available:?})")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    #[error("malformed input in column '{column}' at data row {row}: {message}")]
    MalformedInput {
        column: String,
        row: usize,
        message: String,
    },

    #[error("CSV read failed: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl ParserError {
    pub(crate) fn malformed(column: &str, row_index: usize, message: impl Into<String>) -> Self {
        ParserError::MalformedInput {
            column: column.to_string(),
            // Reported 1-based, counting data rows after the header.
            row: row_index + 1,
            message: message.into(),
        }
    }
}
