//! HTML export of executed notebooks.
//!
//! Without a template the classic notebook layout is produced: every cell in
//! a `cell` container, prompts in `prompt` divs, outputs inside
//! `output_wrapper` / `output` / `output_area`. A custom template is a
//! Jinja file rendered with `minijinja`; it receives the already rendered
//! cell fragments, the raw notebook and the resources map.

use crate::core::HtmlExporter;
use crate::domain::model::{
    mime_text, Cell, CodeCell, ExportOutput, ExportResources, Notebook, Output, TextCell,
};
use crate::domain::ports::ExportSettings;
use crate::utils::error::Result;
use minijinja::{context, path_loader, AutoEscape, Environment};
use pulldown_cmark::{html as markdown_html, Options, Parser};
use regex::Regex;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::LazyLock;

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").unwrap());

/// Richest representation first.
const MIME_PRIORITY: [&str; 6] = [
    "text/html",
    "image/svg+xml",
    "image/png",
    "image/jpeg",
    "text/markdown",
    "text/plain",
];

const BASIC_CSS: &str = "body { font-family: -apple-system, 'Segoe UI', Helvetica, Arial, sans-serif; margin: 0 auto; max-width: 980px; padding: 1em; }
pre { background: #f7f7f7; padding: 0.5em; overflow-x: auto; }
table { border-collapse: collapse; }
th, td { border: 1px solid #ddd; padding: 0.25em 0.5em; }
img { max-width: 100%; }";

#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateExporter;

impl TemplateExporter {
    pub fn new() -> Self {
        Self
    }
}

impl HtmlExporter for TemplateExporter {
    fn export(
        &self,
        notebook: &Notebook,
        settings: &ExportSettings,
        resources: ExportResources,
    ) -> Result<ExportOutput> {
        let language = notebook_language(notebook);
        let cells: Vec<String> = notebook
            .cells
            .iter()
            .map(|cell| render_cell(cell, &language, settings))
            .collect();

        let body = match (&settings.template_dir, &settings.template_file) {
            (Some(dir), Some(file)) => {
                tracing::debug!("Rendering with template {} from {}", file, dir.display());
                render_template(dir, file, notebook, &cells, settings, &resources)?
            }
            _ => render_basic(&resources.metadata.name, &cells),
        };

        Ok(ExportOutput { body, resources })
    }
}

fn render_template(
    dir: &Path,
    file: &str,
    notebook: &Notebook,
    cells: &[String],
    settings: &ExportSettings,
    resources: &ExportResources,
) -> Result<String> {
    let mut env = Environment::new();
    env.set_loader(path_loader(dir));
    // 報告一律為 HTML，不依副檔名判斷
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    let template = env.get_template(file)?;

    Ok(template.render(context! {
        title => &resources.metadata.name,
        resources => resources,
        nb => notebook,
        cells => cells,
        exclude_input => settings.exclude_input,
        exclude_input_prompt => settings.exclude_input_prompt,
        exclude_output_prompt => settings.exclude_output_prompt,
    })?)
}

fn render_basic(title: &str, cells: &[String]) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8" />
<title>{title}</title>
<style type="text/css">
{css}
</style>
</head>
<body>
  <div tabindex="-1" id="notebook" class="border-box-sizing">
    <div class="container" id="notebook-container">
{cells}
    </div>
  </div>
</body>
</html>
"#,
        title = html_escape(title),
        css = BASIC_CSS,
        cells = cells.concat(),
    )
}

fn notebook_language(notebook: &Notebook) -> String {
    notebook
        .metadata
        .extra
        .get("language_info")
        .and_then(|info| info.get("name"))
        .and_then(Value::as_str)
        .or_else(|| {
            notebook
                .metadata
                .kernelspec
                .as_ref()
                .and_then(|spec| spec.language.as_deref())
        })
        .unwrap_or("python")
        .to_string()
}

pub fn render_cell(cell: &Cell, language: &str, settings: &ExportSettings) -> String {
    match cell {
        Cell::Code(code) => render_code_cell(code, language, settings),
        Cell::Markdown(text) => render_markdown_cell(text, settings),
        Cell::Raw(raw) => render_raw_cell(raw),
    }
}

fn prompt(kind: &str, label: &str, count: Option<u32>) -> String {
    let count = count.map(|n| n.to_string()).unwrap_or_else(|| "&nbsp;".to_string());
    format!("<div class=\"prompt {kind}\">{label}&nbsp;[{count}]:</div>\n")
}

fn render_code_cell(cell: &CodeCell, language: &str, settings: &ExportSettings) -> String {
    let mut html = String::from("<div class=\"cell border-box-sizing code_cell rendered\">\n");

    if !settings.exclude_input {
        html.push_str("<div class=\"input\">\n");
        if !settings.exclude_input_prompt {
            html.push_str(&prompt("input_prompt", "In", cell.execution_count));
        }
        html.push_str(&format!(
            "<div class=\"inner_cell\">\n    <div class=\"input_area\">\n<div class=\"highlight hl-{}\"><pre>{}</pre></div>\n    </div>\n</div>\n</div>\n",
            html_escape(language),
            html_escape(&cell.source.text())
        ));
    }

    if !cell.outputs.is_empty() {
        html.push_str("<div class=\"output_wrapper\">\n<div class=\"output\">\n");
        for output in &cell.outputs {
            html.push_str("<div class=\"output_area\">\n");
            match output {
                Output::ExecuteResult {
                    execution_count, ..
                } if !settings.exclude_output_prompt => {
                    html.push_str(&prompt("output_prompt", "Out", *execution_count));
                }
                _ => html.push_str("    <div class=\"prompt\"></div>\n"),
            }
            html.push_str(&render_output(output));
            html.push_str("</div>\n");
        }
        html.push_str("</div>\n</div>\n");
    }

    html.push_str("</div>\n");
    html
}

fn render_output(output: &Output) -> String {
    match output {
        Output::Stream { name, text } => format!(
            "<div class=\"output_subarea output_stream output_{} output_text\">\n<pre>{}</pre>\n</div>\n",
            html_escape(name),
            html_escape(&text.text())
        ),
        Output::Error { traceback, .. } => {
            let traceback = ANSI_ESCAPE.replace_all(&traceback.join("\n"), "").into_owned();
            format!(
                "<div class=\"output_subarea output_text output_error\">\n<pre>{}</pre>\n</div>\n",
                html_escape(&traceback)
            )
        }
        Output::DisplayData { data, .. } => render_mime_bundle(data, ""),
        Output::ExecuteResult { data, .. } => render_mime_bundle(data, " output_execute_result"),
    }
}

fn render_mime_bundle(data: &Map<String, Value>, extra_class: &str) -> String {
    let Some((mime, content)) = MIME_PRIORITY
        .iter()
        .find_map(|mime| mime_text(data, mime).map(|content| (*mime, content)))
    else {
        return String::new();
    };

    match mime {
        "text/html" => format!(
            "<div class=\"output_html rendered_html output_subarea{extra_class}\">\n{content}\n</div>\n"
        ),
        "image/svg+xml" => {
            format!("<div class=\"output_svg output_subarea{extra_class}\">\n{content}\n</div>\n")
        }
        "image/png" | "image/jpeg" => {
            let class = if mime == "image/png" { "output_png" } else { "output_jpeg" };
            let encoded: String = content.split_whitespace().collect();
            format!(
                "<div class=\"{class} output_subarea{extra_class}\">\n<img src=\"data:{mime};base64,{encoded}\">\n</div>\n"
            )
        }
        "text/markdown" => format!(
            "<div class=\"output_markdown rendered_html output_subarea{extra_class}\">\n{}\n</div>\n",
            markdown_to_html(&content)
        ),
        _ => format!(
            "<div class=\"output_text output_subarea{extra_class}\">\n<pre>{}</pre>\n</div>\n",
            html_escape(&content)
        ),
    }
}

fn render_markdown_cell(cell: &TextCell, settings: &ExportSettings) -> String {
    let mut html = String::from("<div class=\"cell border-box-sizing text_cell rendered\">\n");
    if !settings.exclude_input_prompt {
        html.push_str("<div class=\"prompt input_prompt\">\n</div>\n");
    }
    html.push_str(&format!(
        "<div class=\"inner_cell\">\n<div class=\"text_cell_render border-box-sizing rendered_html\">\n{}\n</div>\n</div>\n</div>\n",
        markdown_to_html(&cell.source.text())
    ));
    html
}

fn render_raw_cell(cell: &TextCell) -> String {
    match cell.raw_format() {
        Some("text/html") | Some("html") => format!("{}\n", cell.source.text()),
        _ => String::new(),
    }
}

pub fn markdown_to_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(markdown, options);
    let mut html = String::new();
    markdown_html::push_html(&mut html, parser);
    html
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
