pub mod config;
pub mod encoding;
pub mod error;
pub mod linalg;
pub mod metrics;
pub mod readout;
pub mod reservoir;
pub mod training;
pub mod window;

pub use error::{PipelineError, Result};
