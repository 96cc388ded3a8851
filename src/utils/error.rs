use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("File not found: {}", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    TemplateError(#[from] minijinja::Error),

    #[error("HTML rewriting error: {0}")]
    RewriteError(#[from] lol_html::errors::RewritingError),

    #[error("Invalid HTML selector: {0}")]
    SelectorError(#[from] lol_html::errors::SelectorError),

    #[error("Notebook has no kernelspec name in its metadata")]
    MissingKernelSpec,

    #[error("Unsupported notebook format version {found} (requested {requested})")]
    UnsupportedNotebookVersion { found: u32, requested: u32 },

    #[error("Kernel discovery failed: {message}")]
    KernelDiscovery { message: String },

    #[error("Notebook execution failed ({status}): {stderr}")]
    Execution { status: ExitStatus, stderr: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Execution,
    Rendering,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ReportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ReportError::NotFound { .. }
            | ReportError::MissingKernelSpec
            | ReportError::UnsupportedNotebookVersion { .. }
            | ReportError::SerializationError(_) => ErrorCategory::Input,
            ReportError::KernelDiscovery { .. } | ReportError::Execution { .. } => {
                ErrorCategory::Execution
            }
            ReportError::TemplateError(_)
            | ReportError::RewriteError(_)
            | ReportError::SelectorError(_) => ErrorCategory::Rendering,
            ReportError::ConfigError { .. }
            | ReportError::ConfigValidationError { .. }
            | ReportError::InvalidConfigValueError { .. }
            | ReportError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ReportError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration | ErrorCategory::Input => ErrorSeverity::High,
            // 核心執行失敗可能只是單一 cell 的問題，修正後可重跑
            ErrorCategory::Execution => ErrorSeverity::Medium,
            ErrorCategory::Rendering => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// True when the underlying condition is a missing file.
    pub fn is_not_found(&self) -> bool {
        match self {
            ReportError::NotFound { .. } => true,
            ReportError::IoError(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ReportError::NotFound { path, .. } => {
                format!("Check that {} exists and is readable", path.display())
            }
            ReportError::MissingKernelSpec => {
                "Open and save the notebook in Jupyter so that metadata.kernelspec.name is recorded"
                    .to_string()
            }
            ReportError::UnsupportedNotebookVersion { .. } => {
                "Convert the notebook with `jupyter nbconvert --to notebook --nbformat 4`"
                    .to_string()
            }
            ReportError::KernelDiscovery { .. } => {
                "Make sure Jupyter is installed and `jupyter kernelspec list` works".to_string()
            }
            ReportError::Execution { .. } => {
                "Fix the failing cell (see stderr above) or raise --timeout".to_string()
            }
            ReportError::TemplateError(_) => {
                "Check the template syntax and that referenced templates live next to it"
                    .to_string()
            }
            ReportError::RewriteError(_) | ReportError::SelectorError(_) => {
                "The exported HTML could not be parsed".to_string()
            }
            ReportError::ConfigError { .. }
            | ReportError::ConfigValidationError { .. }
            | ReportError::InvalidConfigValueError { .. }
            | ReportError::MissingConfigError { .. } => {
                "Review the command line options or the TOML configuration file".to_string()
            }
            ReportError::SerializationError(_) => {
                "The notebook file is not valid JSON".to_string()
            }
            ReportError::IoError(_) => {
                "Check disk space and permissions on the report and scratch folders".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("Cannot read the notebook: {}", self),
            ErrorCategory::Execution => format!("Notebook execution failed: {}", self),
            ErrorCategory::Rendering => format!("Cannot render the report: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
