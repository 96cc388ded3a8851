use crate::core::notebook_io::{parse_notebook, to_notebook_string};
use crate::core::{ExecutionEngine, KernelCatalog};
use crate::domain::model::Notebook;
use crate::domain::ports::{ExecutionRequest, KernelShutdown};
use crate::utils::error::{ReportError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

pub const DEFAULT_JUPYTER_COMMAND: &str = "jupyter";

#[derive(Debug, Deserialize)]
struct KernelSpecList {
    kernelspecs: HashMap<String, serde_json::Value>,
}

/// Kernel names from `jupyter kernelspec list --json`.
#[derive(Debug, Clone)]
pub struct JupyterKernelCatalog {
    command: String,
}

impl JupyterKernelCatalog {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for JupyterKernelCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_JUPYTER_COMMAND)
    }
}

pub fn parse_kernelspec_list(json: &str) -> Result<HashSet<String>> {
    let list: KernelSpecList = serde_json::from_str(json)?;
    Ok(list.kernelspecs.into_keys().collect())
}

#[async_trait]
impl KernelCatalog for JupyterKernelCatalog {
    async fn installed_kernels(&self) -> Result<HashSet<String>> {
        let output = Command::new(&self.command)
            .args(["kernelspec", "list", "--json"])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ReportError::KernelDiscovery {
                message: format!("cannot run '{} kernelspec list': {}", self.command, e),
            })?;

        if !output.status.success() {
            return Err(ReportError::KernelDiscovery {
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_kernelspec_list(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Fixed set of kernel names.
#[derive(Debug, Clone, Default)]
pub struct StaticKernelCatalog {
    kernels: HashSet<String>,
}

impl StaticKernelCatalog {
    pub fn new<I, S>(kernels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kernels: kernels.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl KernelCatalog for StaticKernelCatalog {
    async fn installed_kernels(&self) -> Result<HashSet<String>> {
        Ok(self.kernels.clone())
    }
}

/// Executes notebooks through `jupyter nbconvert --execute`, streaming the
/// document over stdin/stdout.
#[derive(Debug, Clone)]
pub struct JupyterEngine {
    command: String,
}

impl JupyterEngine {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn nbconvert_args(request: &ExecutionRequest) -> Vec<String> {
        let shutdown = match request.shutdown {
            KernelShutdown::Graceful => "graceful",
            KernelShutdown::Immediate => "immediate",
        };

        vec![
            "nbconvert".to_string(),
            "--to".to_string(),
            "notebook".to_string(),
            "--execute".to_string(),
            "--stdin".to_string(),
            "--stdout".to_string(),
            format!("--ExecutePreprocessor.kernel_name={}", request.kernel_name),
            format!("--ExecutePreprocessor.timeout={}", request.cell_timeout.as_secs()),
            format!(
                "--ExecutePreprocessor.startup_timeout={}",
                request.startup_timeout.as_secs()
            ),
            format!("--ExecutePreprocessor.shutdown_kernel={}", shutdown),
        ]
    }
}

impl Default for JupyterEngine {
    fn default() -> Self {
        Self::new(DEFAULT_JUPYTER_COMMAND)
    }
}

#[async_trait]
impl ExecutionEngine for JupyterEngine {
    async fn execute(&self, notebook: Notebook, request: &ExecutionRequest) -> Result<Notebook> {
        let version = notebook.nbformat;
        let input = to_notebook_string(&notebook)?;

        let mut child = Command::new(&self.command)
            .args(Self::nbconvert_args(request))
            .current_dir(&request.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input.as_bytes()).await?;
            // 關閉 stdin，nbconvert 才會開始執行
            drop(stdin);
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::error!("nbconvert exited with {}", output.status);
            return Err(ReportError::Execution {
                status: output.status,
                stderr,
            });
        }

        parse_notebook(&String::from_utf8_lossy(&output.stdout), version)
    }
}
