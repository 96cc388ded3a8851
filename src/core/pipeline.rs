use crate::core::clean::clean_report;
use crate::core::executor::{ExecuteOptions, NotebookExecutor};
use crate::core::render::{HtmlRenderer, RenderOptions};
use crate::core::report::Report;
use crate::core::{ExecutionEngine, HtmlExporter, KernelCatalog, Pipeline};
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

/// The three stages for a single notebook.
pub struct NotebookPipeline<K: KernelCatalog, E: ExecutionEngine, X: HtmlExporter> {
    report: Report,
    executor: NotebookExecutor<K, E>,
    renderer: HtmlRenderer<X>,
    execute_options: ExecuteOptions,
    render_options: RenderOptions,
}

impl<K: KernelCatalog, E: ExecutionEngine, X: HtmlExporter> NotebookPipeline<K, E, X> {
    pub fn new(report: Report, catalog: K, engine: E, exporter: X) -> Self {
        Self {
            report,
            executor: NotebookExecutor::new(catalog, engine),
            renderer: HtmlRenderer::new(exporter),
            execute_options: ExecuteOptions::default(),
            render_options: RenderOptions::default(),
        }
    }

    pub fn with_execute_options(mut self, options: ExecuteOptions) -> Self {
        self.execute_options = options;
        self
    }

    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    pub fn report(&self) -> &Report {
        &self.report
    }
}

#[async_trait::async_trait]
impl<K: KernelCatalog, E: ExecutionEngine, X: HtmlExporter> Pipeline for NotebookPipeline<K, E, X> {
    fn notebook(&self) -> &Path {
        self.report().notebook_path()
    }

    async fn execute(&self) -> Result<String> {
        let kernel = self
            .executor
            .execute(&self.report, &self.execute_options)
            .await?;
        Ok(kernel.name().to_string())
    }

    async fn render(&self) -> Result<PathBuf> {
        self.renderer.render(&self.report, &self.render_options)
    }

    async fn clean(&self, report_path: PathBuf) -> Result<PathBuf> {
        clean_report(&report_path)?;
        Ok(report_path)
    }
}
