pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;

pub use config::PipelineConfig;
pub use data::model::{Cell, Table};
pub use pipeline::{RunReport, run};
