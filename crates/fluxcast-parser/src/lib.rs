pub mod errors;
pub mod model;
mod reader;

pub use errors::ParserError;
pub use model::{ColumnSpec, Observation};
pub use reader::{load_observations, observations_from_frame, parse_observations};
