use crate::utils::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A multiline notebook string: stored either as one string or as a list of
/// lines, and written back in the same form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MultilineText {
    Lines(Vec<String>),
    Text(String),
}

impl MultilineText {
    pub fn text(&self) -> String {
        match self {
            MultilineText::Lines(lines) => lines.concat(),
            MultilineText::Text(text) => text.clone(),
        }
    }
}

impl Default for MultilineText {
    fn default() -> Self {
        MultilineText::Text(String::new())
    }
}

impl From<&str> for MultilineText {
    fn from(value: &str) -> Self {
        MultilineText::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    pub cells: Vec<Cell>,
    #[serde(default)]
    pub metadata: NotebookMetadata,
    pub nbformat: u32,
    pub nbformat_minor: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotebookMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernelspec: Option<KernelSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub enum Cell {
    Code(CodeCell),
    Markdown(TextCell),
    Raw(TextCell),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeCell {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub source: MultilineText,
    #[serde(default)]
    pub execution_count: Option<u32>,
    #[serde(default)]
    pub outputs: Vec<Output>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextCell {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub source: MultilineText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Map<String, Value>>,
}

impl TextCell {
    /// Target format of a raw cell (`metadata.format`, older files use
    /// `metadata.raw_mimetype`).
    pub fn raw_format(&self) -> Option<&str> {
        self.metadata
            .get("format")
            .or_else(|| self.metadata.get("raw_mimetype"))
            .and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub enum Output {
    Stream {
        name: String,
        text: MultilineText,
    },
    DisplayData {
        data: Map<String, Value>,
        #[serde(default)]
        metadata: Map<String, Value>,
    },
    ExecuteResult {
        execution_count: Option<u32>,
        data: Map<String, Value>,
        #[serde(default)]
        metadata: Map<String, Value>,
    },
    Error {
        ename: String,
        evalue: String,
        #[serde(default)]
        traceback: Vec<String>,
    },
}

/// Text content of one MIME entry of an output bundle. JSON payloads are
/// re-serialized.
pub fn mime_text(data: &Map<String, Value>, mime: &str) -> Option<String> {
    match data.get(mime)? {
        Value::String(text) => Some(text.clone()),
        Value::Array(lines) => Some(lines.iter().filter_map(Value::as_str).collect()),
        other => serde_json::to_string(other).ok(),
    }
}

impl Notebook {
    /// `metadata.kernelspec.name`, required before execution.
    pub fn kernel_name(&self) -> Result<&str> {
        self.metadata
            .kernelspec
            .as_ref()
            .map(|spec| spec.name.as_str())
            .ok_or(ReportError::MissingKernelSpec)
    }

    pub fn code_cells(&self) -> impl Iterator<Item = &CodeCell> {
        self.cells.iter().filter_map(|cell| match cell {
            Cell::Code(code) => Some(code),
            _ => None,
        })
    }
}

/// Resources handed to the HTML exporter alongside the notebook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportResources {
    pub metadata: ResourceMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceMetadata {
    /// Display title of the report.
    pub name: String,
}

impl ExportResources {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            metadata: ResourceMetadata { name: title.into() },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportOutput {
    pub body: String,
    pub resources: ExportResources,
}
