use crate::domain::model::Notebook;
use std::path::{Path, PathBuf};

/// Paths and default title of one notebook → report conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    notebook_path: PathBuf,
    notebook_folder: PathBuf,
    temporary_notebook: PathBuf,
    report_path: PathBuf,
    title: String,
}

impl Report {
    pub fn new(notebook_path: impl Into<PathBuf>, report_folder: impl AsRef<Path>) -> Self {
        Self::with_scratch_dir(notebook_path, report_folder, std::env::temp_dir())
    }

    /// Same as [`Report::new`] but keeps the executed notebook under `scratch_dir`.
    pub fn with_scratch_dir(
        notebook_path: impl Into<PathBuf>,
        report_folder: impl AsRef<Path>,
        scratch_dir: impl AsRef<Path>,
    ) -> Self {
        let notebook_path = notebook_path.into();
        let file_name = notebook_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let notebook_folder = notebook_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let report_path = report_folder
            .as_ref()
            .join(Path::new(&file_name).with_extension("html"));
        let title = file_name.replace(".ipynb", "").replace('_', " ");

        Self {
            temporary_notebook: scratch_dir.as_ref().join(&file_name),
            notebook_path,
            notebook_folder,
            report_path,
            title,
        }
    }

    pub fn notebook_path(&self) -> &Path {
        &self.notebook_path
    }

    pub fn notebook_folder(&self) -> &Path {
        &self.notebook_folder
    }

    pub fn temporary_notebook(&self) -> &Path {
        &self.temporary_notebook
    }

    pub fn report_path(&self) -> &Path {
        &self.report_path
    }

    pub fn default_title(&self) -> &str {
        &self.title
    }

    /// `metadata.title` when the notebook sets one, else the file-name title.
    pub fn resolve_title(&self, notebook: &Notebook) -> String {
        notebook
            .metadata
            .title
            .clone()
            .unwrap_or_else(|| self.title.clone())
    }
}
