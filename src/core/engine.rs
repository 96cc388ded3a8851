use crate::core::Pipeline;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// What one run produced, serializable for batch summaries.
#[derive(Debug, Clone, Serialize)]
pub struct ReportOutcome {
    pub notebook: PathBuf,
    pub report_path: PathBuf,
    pub kernel: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ReportOutcome {
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

pub struct ReportEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> ReportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<ReportOutcome> {
        let started_at = Utc::now();

        tracing::info!("⚙️ Executing notebook...");
        let kernel = self.pipeline.execute().await?;
        tracing::info!("Executed with kernel '{}'", kernel);

        tracing::info!("🖨️ Rendering HTML...");
        let report_path = self.pipeline.render().await?;
        tracing::debug!("Raw report written to {}", report_path.display());

        tracing::info!("🧹 Cleaning report...");
        let report_path = self.pipeline.clean(report_path).await?;

        let outcome = ReportOutcome {
            notebook: self.pipeline.notebook().to_path_buf(),
            report_path,
            kernel,
            started_at,
            finished_at: Utc::now(),
        };
        tracing::info!(
            "📁 Report saved to: {} ({} ms)",
            outcome.report_path.display(),
            outcome.elapsed().num_milliseconds()
        );
        Ok(outcome)
    }
}
