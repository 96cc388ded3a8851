pub mod clean;
pub mod engine;
pub mod executor;
pub mod kernel;
pub mod notebook_io;
pub mod pipeline;
pub mod render;
pub mod report;

pub use crate::domain::model::Notebook;
pub use crate::domain::ports::{ExecutionEngine, HtmlExporter, KernelCatalog, Pipeline, ReportSettings};
pub use crate::utils::error::Result;
