// Application layer: wires the Jupyter adapters into a notebook pipeline.

use crate::adapters::{JupyterEngine, JupyterKernelCatalog, TemplateExporter};
use crate::core::executor::ExecuteOptions;
use crate::core::pipeline::NotebookPipeline;
use crate::core::render::RenderOptions;
use crate::core::report::Report;
use crate::core::engine::{ReportEngine, ReportOutcome};
use crate::core::{Pipeline, ReportSettings};
use crate::utils::error::ReportError;
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};

pub type JupyterPipeline = NotebookPipeline<JupyterKernelCatalog, JupyterEngine, TemplateExporter>;

/// Pipeline for `notebook` backed by the local Jupyter installation.
pub fn jupyter_pipeline(
    notebook: &Path,
    settings: &dyn ReportSettings,
    template: Option<&Path>,
) -> JupyterPipeline {
    let report = Report::with_scratch_dir(notebook, settings.report_folder(), settings.scratch_dir());
    let command = settings.jupyter_command();

    NotebookPipeline::new(
        report,
        JupyterKernelCatalog::new(command),
        JupyterEngine::new(command),
        TemplateExporter::new(),
    )
    .with_execute_options(ExecuteOptions {
        nbformat_version: settings.nbformat_version(),
        cell_timeout: settings.cell_timeout(),
    })
    .with_render_options(RenderOptions {
        nbformat_version: settings.nbformat_version(),
        template: template.map(Path::to_path_buf),
    })
}

/// Reports built by a batch, plus the failure that stopped it, if any.
#[derive(Debug, Default, Serialize)]
pub struct BatchSummary {
    pub completed: Vec<ReportOutcome>,
    pub failed: Option<BatchFailure>,
}

#[derive(Debug, Serialize)]
pub struct BatchFailure {
    pub notebook: PathBuf,
    #[serde(serialize_with = "serialize_error")]
    pub error: ReportError,
}

fn serialize_error<S: Serializer>(error: &ReportError, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Runs pipelines in order and stops at the first failure.
pub async fn run_batch<P, I>(pipelines: I) -> BatchSummary
where
    P: Pipeline,
    I: IntoIterator<Item = P>,
{
    let mut summary = BatchSummary::default();
    for pipeline in pipelines {
        let notebook = pipeline.notebook().to_path_buf();
        tracing::info!("📓 Processing {}", notebook.display());
        match ReportEngine::new(pipeline).run().await {
            Ok(outcome) => summary.completed.push(outcome),
            Err(error) => {
                tracing::error!("❌ {} failed: {}", notebook.display(), error);
                summary.failed = Some(BatchFailure { notebook, error });
                break;
            }
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::Result;
    use std::sync::{Arc, Mutex};

    struct FakePipeline {
        notebook: PathBuf,
        fail: bool,
        executed: Arc<Mutex<Vec<PathBuf>>>,
    }

    #[async_trait::async_trait]
    impl Pipeline for FakePipeline {
        fn notebook(&self) -> &Path {
            &self.notebook
        }

        async fn execute(&self) -> Result<String> {
            self.executed.lock().unwrap().push(self.notebook.clone());
            if self.fail {
                return Err(ReportError::Execution {
                    status: std::process::ExitStatus::default(),
                    stderr: "KeyError: 'region'".to_string(),
                });
            }
            Ok("python3".to_string())
        }

        async fn render(&self) -> Result<PathBuf> {
            Ok(self.notebook.with_extension("html"))
        }

        async fn clean(&self, report_path: PathBuf) -> Result<PathBuf> {
            Ok(report_path)
        }
    }

    fn pipelines(specs: &[(&str, bool)], executed: &Arc<Mutex<Vec<PathBuf>>>) -> Vec<FakePipeline> {
        specs
            .iter()
            .map(|(path, fail)| FakePipeline {
                notebook: PathBuf::from(path),
                fail: *fail,
                executed: executed.clone(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_run_batch_keeps_completed_reports_on_failure() {
        let executed = Arc::new(Mutex::new(Vec::new()));
        let summary = run_batch(pipelines(
            &[("sales/daily.ipynb", false), ("ops/daily.ipynb", true), ("hr/weekly.ipynb", false)],
            &executed,
        ))
        .await;

        assert_eq!(summary.completed.len(), 1);
        assert_eq!(summary.completed[0].notebook, PathBuf::from("sales/daily.ipynb"));
        assert_eq!(summary.completed[0].report_path, PathBuf::from("sales/daily.html"));

        let failed = summary.failed.as_ref().unwrap();
        assert_eq!(failed.notebook, PathBuf::from("ops/daily.ipynb"));
        assert!(matches!(failed.error, ReportError::Execution { .. }));
        // 失敗後不再執行後續筆記本
        assert_eq!(executed.lock().unwrap().len(), 2);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["completed"][0]["notebook"], "sales/daily.ipynb");
        assert_eq!(json["failed"]["notebook"], "ops/daily.ipynb");
        assert!(json["failed"]["error"].as_str().unwrap().contains("KeyError"));
    }

    #[tokio::test]
    async fn test_run_batch_all_succeed() {
        let executed = Arc::new(Mutex::new(Vec::new()));
        let summary = run_batch(pipelines(
            &[("sales/daily.ipynb", false), ("ops/daily.ipynb", false)],
            &executed,
        ))
        .await;

        assert_eq!(summary.completed.len(), 2);
        assert_ne!(summary.completed[0].notebook, summary.completed[1].notebook);
        assert!(summary.failed.is_none());
    }
}
