pub mod cleaning;
pub mod config;
pub mod error;
pub mod features;
pub mod forecast;
pub mod pipeline;
pub mod scaling;
pub mod smoothing;
pub mod splitting;
pub mod types;
pub mod windowing;

pub use error::{PipelineError, Result};
pub use fluxcast_parser::{ColumnSpec, Observation};
