use crate::adapters::jupyter::DEFAULT_JUPYTER_COMMAND;
use crate::config::validate_settings;
use crate::core::executor::DEFAULT_CELL_TIMEOUT;
use crate::core::notebook_io::SUPPORTED_NBFORMAT;
use crate::core::ReportSettings;
use crate::utils::error::{ReportError, Result};
use crate::utils::validation::{validate_file_extension, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub report: ReportSection,
    pub execution: Option<ExecutionSection>,
    pub render: Option<RenderSection>,
    #[serde(default)]
    pub notebooks: Vec<NotebookEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSection {
    pub output_folder: PathBuf,
    pub scratch_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionSection {
    pub timeout_seconds: Option<u64>,
    pub nbformat_version: Option<u32>,
    pub jupyter_command: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderSection {
    pub template: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotebookEntry {
    pub path: PathBuf,
    /// Overrides `[render] template` for this notebook.
    pub template: Option<PathBuf>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ReportError::NotFound {
                    path: path.to_path_buf(),
                    source,
                }
            } else {
                ReportError::IoError(source)
            }
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ReportError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${REPORT_ROOT})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ReportError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Template for one notebook: its own override, else the global one.
    pub fn template_for<'a>(&'a self, entry: &'a NotebookEntry) -> Option<&'a Path> {
        entry.template.as_deref().or_else(|| self.template())
    }

    pub fn validate_config(&self) -> Result<()> {
        if self.notebooks.is_empty() {
            return Err(ReportError::ConfigValidationError {
                field: "notebooks".to_string(),
                message: "at least one [[notebooks]] entry is required".to_string(),
            });
        }

        validate_settings(self)?;

        for entry in &self.notebooks {
            validate_file_extension("notebooks.path", &entry.path, &["ipynb"])?;
            if let Some(template) = &entry.template {
                validate_file_extension(
                    "notebooks.template",
                    template,
                    &crate::config::TEMPLATE_EXTENSIONS,
                )?;
            }
        }

        Ok(())
    }
}

impl ReportSettings for TomlConfig {
    fn report_folder(&self) -> &Path {
        &self.report.output_folder
    }

    fn scratch_dir(&self) -> PathBuf {
        self.report
            .scratch_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    fn template(&self) -> Option<&Path> {
        self.render.as_ref().and_then(|r| r.template.as_deref())
    }

    fn cell_timeout(&self) -> Duration {
        self.execution
            .as_ref()
            .and_then(|e| e.timeout_seconds)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CELL_TIMEOUT)
    }

    fn nbformat_version(&self) -> u32 {
        self.execution
            .as_ref()
            .and_then(|e| e.nbformat_version)
            .unwrap_or(SUPPORTED_NBFORMAT)
    }

    fn jupyter_command(&self) -> &str {
        self.execution
            .as_ref()
            .and_then(|e| e.jupyter_command.as_deref())
            .unwrap_or(DEFAULT_JUPYTER_COMMAND)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_toml_config() {
        let toml_content = r#"
[report]
output_folder = "./reports"

[[notebooks]]
path = "notebooks/daily_summary.ipynb"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.report_folder(), Path::new("./reports"));
        assert_eq!(config.notebooks.len(), 1);
        assert_eq!(config.cell_timeout(), Duration::from_secs(3600));
        assert_eq!(config.nbformat_version(), 4);
        assert_eq!(config.jupyter_command(), "jupyter");
        assert_eq!(config.scratch_dir(), std::env::temp_dir());
        assert!(config.template().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_template_override() {
        let toml_content = r#"
[report]
output_folder = "/srv/reports"
scratch_dir = "/var/tmp/notebooks"

[execution]
timeout_seconds = 600
jupyter_command = "/opt/conda/bin/jupyter"

[render]
template = "templates/report.html.j2"

[[notebooks]]
path = "daily_summary.ipynb"

[[notebooks]]
path = "board_pack.ipynb"
template = "templates/board.html.j2"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.cell_timeout(), Duration::from_secs(600));
        assert_eq!(config.jupyter_command(), "/opt/conda/bin/jupyter");
        assert_eq!(config.scratch_dir(), PathBuf::from("/var/tmp/notebooks"));
        assert_eq!(
            config.template_for(&config.notebooks[0]),
            Some(Path::new("templates/report.html.j2"))
        );
        assert_eq!(
            config.template_for(&config.notebooks[1]),
            Some(Path::new("templates/board.html.j2"))
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("NOTEBOOK_REPORT_TEST_ROOT", "/mnt/shared");
        let toml_content = r#"
[report]
output_folder = "${NOTEBOOK_REPORT_TEST_ROOT}/reports"

[[notebooks]]
path = "${NOTEBOOK_REPORT_TEST_UNSET}/a.ipynb"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.report_folder(), Path::new("/mnt/shared/reports"));
        assert_eq!(
            config.notebooks[0].path,
            PathBuf::from("${NOTEBOOK_REPORT_TEST_UNSET}/a.ipynb")
        );
    }

    #[test]
    fn test_validation_failures() {
        let no_notebooks = TomlConfig::from_toml_str("[report]\noutput_folder = \"out\"\n").unwrap();
        assert!(matches!(
            no_notebooks.validate(),
            Err(ReportError::ConfigValidationError { .. })
        ));

        let wrong_version = TomlConfig::from_toml_str(
            "[report]\noutput_folder = \"out\"\n[execution]\nnbformat_version = 3\n[[notebooks]]\npath = \"a.ipynb\"\n",
        )
        .unwrap();
        assert!(wrong_version.validate().is_err());

        let not_a_notebook = TomlConfig::from_toml_str(
            "[report]\noutput_folder = \"out\"\n[[notebooks]]\npath = \"a.py\"\n",
        )
        .unwrap();
        assert!(not_a_notebook.validate().is_err());
    }

    #[test]
    fn test_invalid_toml() {
        let err = TomlConfig::from_toml_str("[report\noutput_folder = 1").unwrap_err();
        assert!(matches!(err, ReportError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[report]\noutput_folder = \"out\"\n[[notebooks]]\npath = \"a.ipynb\"").unwrap();

        let config = TomlConfig::from_file(file.path()).unwrap();
        assert_eq!(config.notebooks[0].path, PathBuf::from("a.ipynb"));

        let err = TomlConfig::from_file("/nonexistent/batch.toml").unwrap_err();
        assert!(err.is_not_found());
    }
}
