pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::{toml_config::TomlConfig, CliConfig};

pub use adapters::{JupyterEngine, JupyterKernelCatalog, StaticKernelCatalog, TemplateExporter};
pub use crate::core::{
    clean::{clean_html, clean_report},
    engine::{ReportEngine, ReportOutcome},
    kernel::{resolve_kernel, KernelChoice, FALLBACK_KERNEL},
    pipeline::NotebookPipeline,
    report::Report,
};
pub use utils::error::{ReportError, Result};
