use crate::domain::model::{ExportOutput, ExportResources, Notebook};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Source of the kernel names installed on the host.
#[async_trait]
pub trait KernelCatalog: Send + Sync {
    async fn installed_kernels(&self) -> Result<HashSet<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelShutdown {
    Graceful,
    Immediate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub kernel_name: String,
    pub cell_timeout: Duration,
    pub startup_timeout: Duration,
    /// Kernel working directory, so relative paths inside the notebook resolve.
    pub working_dir: PathBuf,
    pub shutdown: KernelShutdown,
}

/// Runs every cell of a notebook and returns it with outputs filled in.
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    async fn execute(&self, notebook: Notebook, request: &ExecutionRequest) -> Result<Notebook>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSettings {
    /// Directory templates are loaded from.
    pub template_dir: Option<PathBuf>,
    /// Root template, relative to `template_dir`.
    pub template_file: Option<String>,
    pub exclude_input: bool,
    pub exclude_input_prompt: bool,
    pub exclude_output_prompt: bool,
}

pub trait HtmlExporter: Send + Sync {
    fn export(
        &self,
        notebook: &Notebook,
        settings: &ExportSettings,
        resources: ExportResources,
    ) -> Result<ExportOutput>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Source notebook this pipeline reports on.
    fn notebook(&self) -> &Path;
    /// Executes the notebook, returning the name of the kernel actually used.
    async fn execute(&self) -> Result<String>;
    /// Exports the executed notebook, returning the report path.
    async fn render(&self) -> Result<PathBuf>;
    async fn clean(&self, report_path: PathBuf) -> Result<PathBuf>;
}

/// Settings shared by the command line and the TOML batch file.
pub trait ReportSettings: Send + Sync {
    fn report_folder(&self) -> &Path;
    /// Where executed notebooks are kept between execution and rendering.
    fn scratch_dir(&self) -> PathBuf;
    fn template(&self) -> Option<&Path>;
    fn cell_timeout(&self) -> Duration;
    fn nbformat_version(&self) -> u32;
    fn jupyter_command(&self) -> &str;
}
