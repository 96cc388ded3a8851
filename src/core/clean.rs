//! Post-processing of the exported report.
//!
//! The exporter wraps every cell in layout containers and prompt markers
//! that are noise in a standalone report. Cleaning deletes the prompts and
//! raw-text echoes, unwraps the containers in place, and strips generated
//! styling from tables that were not given an explicit `id`.

use crate::utils::error::Result;
use lol_html::html_content::Element;
use lol_html::{rewrite_str, ElementContentHandlers, RewriteStrSettings, Selector};
use std::borrow::Cow;
use std::fs;
use std::path::Path;

/// Classes whose `div` is removed together with everything inside it.
pub const CLASSES_TO_REMOVE: [&str; 2] = ["output_text", "prompt"];

/// Classes whose `div` is replaced by its children.
pub const CLASSES_TO_UNWRAP: [&str; 9] = [
    "border-box-sizing",
    "container",
    "cell",
    "inner_cell",
    "rendered_html",
    "output_prompt",
    "output_wrapper",
    "output",
    "output_area",
];

fn div_selector(class: &str) -> Result<Selector> {
    Ok(format!("div.{}", class).parse::<Selector>()?)
}

fn strip_attributes(el: &mut Element) {
    let names: Vec<String> = el.attributes().iter().map(|attr| attr.name()).collect();
    for name in names {
        el.remove_attribute(&name);
    }
}

/// Cleans an HTML document. The input is never modified; running the
/// result through again yields the same string.
pub fn clean_html(html: &str) -> Result<String> {
    let mut handlers = Vec::with_capacity(CLASSES_TO_REMOVE.len() + CLASSES_TO_UNWRAP.len() + 1);

    // 刪除規則必須排在解包規則之前
    for class in CLASSES_TO_REMOVE {
        handlers.push((
            Cow::Owned(div_selector(class)?),
            ElementContentHandlers::default().element(|el| {
                el.remove();
                Ok(())
            }),
        ));
    }

    for class in CLASSES_TO_UNWRAP {
        handlers.push((
            Cow::Owned(div_selector(class)?),
            ElementContentHandlers::default().element(|el| {
                if !el.removed() {
                    el.remove_and_keep_content();
                }
                Ok(())
            }),
        ));
    }

    handlers.push((
        Cow::Owned("table".parse::<Selector>()?),
        ElementContentHandlers::default().element(|el| {
            if !el.has_attribute("id") {
                strip_attributes(el);
            }
            Ok(())
        }),
    ));

    let rewritten = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: handlers,
            strict: false,
            ..RewriteStrSettings::default()
        },
    )?;

    Ok(remove_blank_lines(&rewritten))
}

pub fn remove_blank_lines(html: &str) -> String {
    html.split('\n')
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cleans the report file in place, writing it back as UTF-8.
pub fn clean_report(report_path: &Path) -> Result<()> {
    let bare_html = fs::read_to_string(report_path)?;
    let light_html = clean_html(&bare_html)?;
    fs::write(report_path, light_html.as_bytes())?;
    Ok(())
}
