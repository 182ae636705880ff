//! Writer for the sheetbind document format.

use crate::document::{CellContent, Document, Object};
use crate::error::Result;
use sheetbind_engine::engine::{Value, render_qualifier};
use std::fs;
use std::path::Path;

/// Write a document to a file.
pub fn write_document(path: &Path, document: &Document) -> Result<()> {
    let content = write_document_content(document);
    fs::write(path, content)?;
    Ok(())
}

/// Write a document to a string. Objects keep their order; cells are written row-major and
/// aliases sorted by name, so unchanged documents serialize identically.
pub fn write_document_content(document: &Document) -> String {
    let mut lines = vec!["# sheetbind document".to_string()];
    if document.label() != document.name() {
        lines.push(format!("@label {}", document.label()));
    }
    for ((docq, objq), (docname, objname)) in document.links() {
        lines.push(format!(
            "@link {}#{} = {}#{}",
            render_qualifier(docq),
            render_qualifier(objq),
            render_qualifier(docname),
            render_qualifier(objname)
        ));
    }

    for object in document.objects() {
        lines.push(String::new());
        match object {
            Object::Sheet(sheet) => {
                lines.push(format!("[sheet {}]", sheet.name()));
                if sheet.label() != sheet.name() {
                    lines.push(format!("@label {}", sheet.label()));
                }
                for (address, cell) in sheet.cells() {
                    let value_str = match &cell.content {
                        CellContent::Empty => continue, // Alias-only cells
                        CellContent::Literal { value, .. } => write_value(value),
                        CellContent::Formula(formula) => format!("={}", formula.source()),
                    };
                    lines.push(format!("{}: {}", address, value_str));
                }
                for (name, address) in sheet.aliases().iter() {
                    lines.push(format!("@alias {} {}", address, name));
                }
            }
            Object::Feature(feature) => {
                lines.push(format!("[feature {} {}]", feature.name(), feature.type_name()));
                if feature.label() != feature.name() {
                    lines.push(format!("@label {}", feature.label()));
                }
                for (name, property) in feature.properties() {
                    match property.binding() {
                        Some(formula) => lines.push(format!("{}: ={}", name, formula.source())),
                        None if property.value().is_empty() => lines.push(format!("{}:", name)),
                        None => lines.push(format!("{}: {}", name, write_value(&property.value()))),
                    }
                }
            }
        }
    }

    lines.join("\n") + "\n"
}

fn write_value(value: &Value) -> String {
    match value {
        Value::Empty => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Value::Text(s) => format!("\"{}\"", escape_text(s)),
    }
}

fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out
}
