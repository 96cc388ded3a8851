pub mod toml_config;

use crate::adapters::jupyter::DEFAULT_JUPYTER_COMMAND;
use crate::core::notebook_io::SUPPORTED_NBFORMAT;
use crate::core::ReportSettings;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_file_extension, validate_non_empty_string, validate_path, validate_positive_number,
    validate_range, Validate,
};
#[cfg(feature = "cli")]
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Extensions accepted for custom templates.
pub const TEMPLATE_EXTENSIONS: [&str; 5] = ["j2", "jinja", "jinja2", "html", "tpl"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(Parser))]
#[cfg_attr(feature = "cli", command(name = "notebook-report"))]
#[cfg_attr(
    feature = "cli",
    command(about = "Execute a Jupyter notebook and turn it into a clean HTML report")
)]
pub struct CliConfig {
    /// Notebook to execute
    pub notebook: PathBuf,

    #[cfg_attr(feature = "cli", arg(long, default_value = "./reports"))]
    pub report_folder: PathBuf,

    /// Custom Jinja template; hides code and prompts when set
    #[cfg_attr(feature = "cli", arg(long))]
    pub template: Option<PathBuf>,

    /// Per-cell execution timeout in seconds
    #[cfg_attr(feature = "cli", arg(long, default_value = "3600"))]
    pub timeout: u64,

    #[cfg_attr(feature = "cli", arg(long, default_value = "4"))]
    pub nbformat_version: u32,

    /// Where the executed notebook is kept before rendering (defaults to the OS temp dir)
    #[cfg_attr(feature = "cli", arg(long))]
    pub scratch_dir: Option<PathBuf>,

    #[cfg_attr(feature = "cli", arg(long, default_value = DEFAULT_JUPYTER_COMMAND))]
    pub jupyter: String,

    #[cfg_attr(feature = "cli", arg(long, help = "Enable verbose output"))]
    pub verbose: bool,
}

impl ReportSettings for CliConfig {
    fn report_folder(&self) -> &Path {
        &self.report_folder
    }

    fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    fn template(&self) -> Option<&Path> {
        self.template.as_deref()
    }

    fn cell_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    fn nbformat_version(&self) -> u32 {
        self.nbformat_version
    }

    fn jupyter_command(&self) -> &str {
        &self.jupyter
    }
}

/// Checks shared by every source of [`ReportSettings`].
pub fn validate_settings(settings: &dyn ReportSettings) -> Result<()> {
    validate_path("report_folder", settings.report_folder())?;
    validate_positive_number("timeout", settings.cell_timeout().as_secs(), 1)?;
    validate_range(
        "nbformat_version",
        settings.nbformat_version(),
        SUPPORTED_NBFORMAT,
        SUPPORTED_NBFORMAT,
    )?;
    validate_non_empty_string("jupyter", settings.jupyter_command())?;
    if let Some(template) = settings.template() {
        validate_file_extension("template", template, &TEMPLATE_EXTENSIONS)?;
    }
    Ok(())
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_file_extension("notebook", &self.notebook, &["ipynb"])?;
        validate_settings(self)
    }
}
