use crate::core::notebook_io::{read_notebook, SUPPORTED_NBFORMAT};
use crate::core::report::Report;
use crate::core::HtmlExporter;
use crate::domain::model::ExportResources;
use crate::domain::ports::ExportSettings;
use crate::utils::error::{ReportError, Result};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub nbformat_version: u32,
    /// Custom root template; the built-in layout is used when unset.
    pub template: Option<PathBuf>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            nbformat_version: SUPPORTED_NBFORMAT,
            template: None,
        }
    }
}

/// Builds exporter settings for an optional custom template.
pub fn export_settings(template: Option<&Path>) -> Result<ExportSettings> {
    let Some(template) = template else {
        return Ok(ExportSettings::default());
    };

    if let Err(source) = fs::metadata(template) {
        return Err(ReportError::NotFound {
            path: template.to_path_buf(),
            source,
        });
    }

    let template_dir = template
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let template_file = template
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());

    Ok(ExportSettings {
        template_dir: Some(template_dir),
        template_file,
        exclude_input: true,
        exclude_input_prompt: true,
        exclude_output_prompt: true,
    })
}

pub struct HtmlRenderer<X: HtmlExporter> {
    exporter: X,
}

impl<X: HtmlExporter> HtmlRenderer<X> {
    pub fn new(exporter: X) -> Self {
        Self { exporter }
    }

    /// Exports the executed notebook to the report path, then removes the
    /// temporary notebook.
    pub fn render(&self, report: &Report, options: &RenderOptions) -> Result<PathBuf> {
        let settings = export_settings(options.template.as_deref())?;

        let notebook = read_notebook(report.temporary_notebook(), options.nbformat_version)?;
        let title = report.resolve_title(&notebook);
        tracing::debug!("Rendering '{}' with settings {:?}", title, settings);

        let output = self
            .exporter
            .export(&notebook, &settings, ExportResources::titled(title))?;

        let report_path = report.report_path();
        if let Some(parent) = report_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(report_path, output.body.as_bytes())?;
        fs::remove_file(report.temporary_notebook())?;

        Ok(report_path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::notebook_io::write_notebook;
    use crate::domain::model::{ExportOutput, Notebook};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Echoes the title and settings into the body.
    #[derive(Clone, Default)]
    struct EchoExporter {
        seen: Arc<Mutex<Vec<ExportSettings>>>,
    }

    impl HtmlExporter for EchoExporter {
        fn export(
            &self,
            _notebook: &Notebook,
            settings: &ExportSettings,
            resources: ExportResources,
        ) -> Result<ExportOutput> {
            self.seen.lock().unwrap().push(settings.clone());
            Ok(ExportOutput {
                body: format!("<title>{}</title>", resources.metadata.name),
                resources,
            })
        }
    }

    fn stage(dir: &Path, title: Option<&str>) -> Report {
        let report = Report::with_scratch_dir(
            dir.join("daily_summary.ipynb"),
            dir.join("reports"),
            dir.join("scratch"),
        );
        let mut metadata = serde_json::json!({"kernelspec": {"name": "python3"}});
        if let Some(title) = title {
            metadata["title"] = serde_json::Value::String(title.to_string());
        }
        let notebook: Notebook = serde_json::from_value(serde_json::json!({
            "cells": [],
            "metadata": metadata,
            "nbformat": 4,
            "nbformat_minor": 5
        }))
        .unwrap();
        write_notebook(&notebook, report.temporary_notebook()).unwrap();
        report
    }

    #[test]
    fn test_render_default_title_and_cleanup() {
        let dir = TempDir::new().unwrap();
        let report = stage(dir.path(), None);
        let exporter = EchoExporter::default();

        let path = HtmlRenderer::new(exporter.clone())
            .render(&report, &RenderOptions::default())
            .unwrap();

        assert_eq!(path, dir.path().join("reports").join("daily_summary.html"));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "<title>daily summary</title>"
        );
        assert!(!report.temporary_notebook().exists());
        assert_eq!(exporter.seen.lock().unwrap()[0], ExportSettings::default());
    }

    #[test]
    fn test_render_metadata_title_wins() {
        let dir = TempDir::new().unwrap();
        let report = stage(dir.path(), Some("X"));

        let path = HtmlRenderer::new(EchoExporter::default())
            .render(&report, &RenderOptions::default())
            .unwrap();

        assert_eq!(std::fs::read_to_string(path).unwrap(), "<title>X</title>");
    }

    #[test]
    fn test_render_with_template_sets_exclusions() {
        let dir = TempDir::new().unwrap();
        let report = stage(dir.path(), None);
        let template = dir.path().join("templates").join("report.html.j2");
        std::fs::create_dir_all(template.parent().unwrap()).unwrap();
        std::fs::write(&template, "{{ title }}").unwrap();

        let exporter = EchoExporter::default();
        let options = RenderOptions {
            template: Some(template.clone()),
            ..RenderOptions::default()
        };
        HtmlRenderer::new(exporter.clone()).render(&report, &options).unwrap();

        let seen = exporter.seen.lock().unwrap();
        assert_eq!(seen[0].template_dir.as_deref(), template.parent());
        assert_eq!(seen[0].template_file.as_deref(), Some("report.html.j2"));
        assert!(seen[0].exclude_input && seen[0].exclude_input_prompt && seen[0].exclude_output_prompt);
    }

    #[test]
    fn test_missing_template_propagates() {
        let dir = TempDir::new().unwrap();
        let report = stage(dir.path(), None);
        let options = RenderOptions {
            template: Some(dir.path().join("absent.html.j2")),
            ..RenderOptions::default()
        };

        let err = HtmlRenderer::new(EchoExporter::default())
            .render(&report, &options)
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(report.temporary_notebook().exists());
    }

    #[test]
    fn test_missing_temporary_notebook_propagates() {
        let dir = TempDir::new().unwrap();
        let report = Report::with_scratch_dir(
            dir.path().join("never_executed.ipynb"),
            dir.path(),
            dir.path(),
        );

        let err = HtmlRenderer::new(EchoExporter::default())
            .render(&report, &RenderOptions::default())
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
