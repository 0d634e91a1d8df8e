pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod logging;
pub mod pipeline;

pub use config::{Config, RecordErrorPolicy};
pub use error::{PipelineError, Result};
pub use pipeline::{Pipeline, PipelineResult};
