use crate::domain::model::Notebook;
use crate::utils::error::{ReportError, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// The only notebook format major version the reader understands.
pub const SUPPORTED_NBFORMAT: u32 = 4;

pub fn read_notebook(path: &Path, as_version: u32) -> Result<Notebook> {
    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ReportError::NotFound {
                path: path.to_path_buf(),
                source,
            }
        } else {
            ReportError::IoError(source)
        }
    })?;
    parse_notebook(&content, as_version)
}

pub fn parse_notebook(content: &str, as_version: u32) -> Result<Notebook> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let found = value
        .get("nbformat")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(0) as u32;

    // 不做格式轉換，版本不符直接拒絕
    if found != as_version || as_version != SUPPORTED_NBFORMAT {
        return Err(ReportError::UnsupportedNotebookVersion {
            found,
            requested: as_version,
        });
    }

    Ok(serde_json::from_value(value)?)
}

/// Serializes with the one-space indent Jupyter itself writes.
pub fn to_notebook_string(notebook: &Notebook) -> Result<String> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    notebook.serialize(&mut serializer)?;
    buffer.push(b'\n');
    String::from_utf8(buffer)
        .map_err(|e| ReportError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

pub fn write_notebook(notebook: &Notebook, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, to_notebook_string(notebook)?)?;
    Ok(())
}
