use crate::core::kernel::{resolve_kernel, KernelChoice};
use crate::core::notebook_io::{read_notebook, write_notebook, SUPPORTED_NBFORMAT};
use crate::core::report::Report;
use crate::core::{ExecutionEngine, KernelCatalog};
use crate::domain::ports::{ExecutionRequest, KernelShutdown};
use crate::utils::error::Result;
use std::time::Duration;

/// Kernels can be slow to boot on small hosts, so startup gets a generous ceiling.
pub const KERNEL_STARTUP_TIMEOUT: Duration = Duration::from_secs(300);

pub const DEFAULT_CELL_TIMEOUT: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteOptions {
    pub nbformat_version: u32,
    pub cell_timeout: Duration,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            nbformat_version: SUPPORTED_NBFORMAT,
            cell_timeout: DEFAULT_CELL_TIMEOUT,
        }
    }
}

pub struct NotebookExecutor<K: KernelCatalog, E: ExecutionEngine> {
    catalog: K,
    engine: E,
}

impl<K: KernelCatalog, E: ExecutionEngine> NotebookExecutor<K, E> {
    pub fn new(catalog: K, engine: E) -> Self {
        Self { catalog, engine }
    }

    /// Executes the notebook of `report` and writes the result to its
    /// temporary notebook path. Errors are returned untouched.
    pub async fn execute(&self, report: &Report, options: &ExecuteOptions) -> Result<KernelChoice> {
        let notebook = read_notebook(report.notebook_path(), options.nbformat_version)?;
        let kernel = resolve_kernel(notebook.kernel_name()?, &self.catalog).await?;

        let request = ExecutionRequest {
            kernel_name: kernel.name().to_string(),
            cell_timeout: options.cell_timeout,
            startup_timeout: KERNEL_STARTUP_TIMEOUT,
            working_dir: report.notebook_folder().to_path_buf(),
            shutdown: KernelShutdown::Immediate,
        };

        tracing::debug!(
            "Executing {} cells with kernel '{}' in {}",
            notebook.cells.len(),
            request.kernel_name,
            request.working_dir.display()
        );
        let executed = self.engine.execute(notebook, &request).await?;

        write_notebook(&executed, report.temporary_notebook())?;
        tracing::debug!(
            "Executed notebook written to {}",
            report.temporary_notebook().display()
        );

        Ok(kernel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::jupyter::StaticKernelCatalog;
    use crate::domain::model::{Cell, Notebook, Output};
    use crate::utils::error::ReportError;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Records the request and appends a stdout output to each code cell.
    #[derive(Clone, Default)]
    struct RecordingEngine {
        requests: Arc<Mutex<Vec<ExecutionRequest>>>,
    }

    #[async_trait::async_trait]
    impl ExecutionEngine for RecordingEngine {
        async fn execute(&self, mut notebook: Notebook, request: &ExecutionRequest) -> Result<Notebook> {
            self.requests.lock().unwrap().push(request.clone());
            for (index, cell) in notebook.cells.iter_mut().enumerate() {
                if let Cell::Code(code) = cell {
                    code.execution_count = Some(index as u32 + 1);
                    code.outputs.push(Output::Stream {
                        name: "stdout".to_string(),
                        text: "hi\n".into(),
                    });
                }
            }
            Ok(notebook)
        }
    }

    struct FailingEngine;

    #[async_trait::async_trait]
    impl ExecutionEngine for FailingEngine {
        async fn execute(&self, _notebook: Notebook, _request: &ExecutionRequest) -> Result<Notebook> {
            Err(ReportError::Execution {
                status: std::process::ExitStatus::default(),
                stderr: "ZeroDivisionError: division by zero".to_string(),
            })
        }
    }

    fn write_source(dir: &Path, kernel: &str) -> std::path::PathBuf {
        let path = dir.join("daily_summary.ipynb");
        let content = serde_json::json!({
            "cells": [{"cell_type": "code", "execution_count": null, "metadata": {}, "outputs": [], "source": "print(\"hi\")"}],
            "metadata": {"kernelspec": {"name": kernel}},
            "nbformat": 4,
            "nbformat_minor": 5
        });
        std::fs::write(&path, content.to_string()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_execute_writes_temporary_notebook() {
        let source_dir = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let path = write_source(source_dir.path(), "python3");
        let report = Report::with_scratch_dir(&path, source_dir.path(), scratch.path());

        let engine = RecordingEngine::default();
        let executor = NotebookExecutor::new(StaticKernelCatalog::new(["python3"]), engine.clone());
        let kernel = executor.execute(&report, &ExecuteOptions::default()).await.unwrap();

        assert_eq!(kernel, KernelChoice::Requested("python3".to_string()));

        let executed = read_notebook(report.temporary_notebook(), 4).unwrap();
        let code = executed.code_cells().next().unwrap();
        assert_eq!(code.execution_count, Some(1));
        assert_eq!(code.outputs.len(), 1);

        let requests = engine.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].working_dir, source_dir.path());
        assert_eq!(requests[0].cell_timeout, Duration::from_secs(3600));
        assert_eq!(requests[0].startup_timeout, Duration::from_secs(300));
        assert_eq!(requests[0].shutdown, KernelShutdown::Immediate);
    }

    #[tokio::test]
    async fn test_execute_uses_fallback_kernel() {
        let source_dir = TempDir::new().unwrap();
        let path = write_source(source_dir.path(), "my-local-venv");
        let report = Report::with_scratch_dir(&path, source_dir.path(), source_dir.path().join("tmp"));

        let engine = RecordingEngine::default();
        let executor = NotebookExecutor::new(StaticKernelCatalog::new(["python3"]), engine.clone());
        let options = ExecuteOptions {
            cell_timeout: Duration::from_secs(60),
            ..ExecuteOptions::default()
        };
        let kernel = executor.execute(&report, &options).await.unwrap();

        assert!(kernel.is_fallback());
        let requests = engine.requests.lock().unwrap();
        assert_eq!(requests[0].kernel_name, "python3");
        assert_eq!(requests[0].cell_timeout, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_missing_notebook_propagates() {
        let dir = TempDir::new().unwrap();
        let report = Report::with_scratch_dir(dir.path().join("gone.ipynb"), dir.path(), dir.path());
        let executor = NotebookExecutor::new(StaticKernelCatalog::new(["python3"]), RecordingEngine::default());

        let err = executor.execute(&report, &ExecuteOptions::default()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_engine_failure_leaves_no_new_temp_file() {
        let source_dir = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let path = write_source(source_dir.path(), "python3");
        let report = Report::with_scratch_dir(&path, source_dir.path(), scratch.path());

        let executor = NotebookExecutor::new(StaticKernelCatalog::new(["python3"]), FailingEngine);
        let err = executor.execute(&report, &ExecuteOptions::default()).await.unwrap_err();

        assert!(matches!(err, ReportError::Execution { .. }));
        assert!(!report.temporary_notebook().exists());
    }
}
