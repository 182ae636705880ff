//! Parser for the sheetbind document format.

use crate::document::{
    Cell, CellContent, Document, Feature, Formula, Object, Sheet, validate_label,
};
use crate::error::{CoreError, Result};
use sheetbind_engine::engine::{CellAddress, Expression, Value, is_identifier};
use std::fs;
use std::path::Path;

/// Parse a document file. The document is named after the file stem.
pub fn parse_document(path: &Path) -> Result<Document> {
    let content = fs::read_to_string(path)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut document = parse_document_content(&content, &name)?;
    document.file_path = Some(path.to_path_buf());
    Ok(document)
}

fn error(line: usize, message: impl Into<String>) -> CoreError {
    CoreError::Storage {
        line,
        message: message.into(),
    }
}

/// Parse document content from a string.
pub fn parse_document_content(content: &str, name: &str) -> Result<Document> {
    let mut document = Document::new(name);
    // Index of the object the following lines belong to.
    let mut current: Option<usize> = None;

    for (line_num, line) in content.lines().enumerate() {
        let line_num = line_num + 1;
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(header) = line.strip_prefix('[') {
            let header = header
                .strip_suffix(']')
                .ok_or_else(|| error(line_num, "Unterminated section header"))?;
            let object = parse_section(header, line_num)?;
            document
                .add_object(object)
                .map_err(|e| error(line_num, e.to_string()))?;
            current = Some(document.objects().len() - 1);
            continue;
        }

        if let Some(directive) = line.strip_prefix('@') {
            let (keyword, rest) = directive.split_once(' ').unwrap_or((directive, ""));
            let rest = rest.trim();
            match (keyword, current) {
                ("label", None) => {
                    validate_label(rest).map_err(|e| error(line_num, e.to_string()))?;
                    document.set_label(rest);
                }
                ("label", Some(index)) => {
                    validate_label(rest).map_err(|e| error(line_num, e.to_string()))?;
                    document.object_at_mut(index).set_label(rest);
                }
                ("link", None) => {
                    let (key, target) = parse_link(rest)
                        .ok_or_else(|| error(line_num, format!("Invalid link: {}", rest)))?;
                    document.links.insert(key, target);
                }
                ("alias", Some(index)) => {
                    let sheet = document
                        .object_at_mut(index)
                        .as_sheet_mut()
                        .ok_or_else(|| error(line_num, "@alias outside a sheet section"))?;
                    let (address, alias) = rest
                        .split_once(' ')
                        .ok_or_else(|| error(line_num, "Expected '@alias ADDRESS NAME'"))?;
                    let address =
                        CellAddress::parse(address).map_err(|e| error(line_num, e.to_string()))?;
                    sheet
                        .set_alias(address, alias.trim())
                        .map_err(|e| error(line_num, e.to_string()))?;
                }
                _ => return Err(error(line_num, format!("Unexpected directive: @{}", keyword))),
            }
            continue;
        }

        let Some(index) = current else {
            return Err(error(line_num, "Content before the first section"));
        };
        // Parse "KEY: VALUE" format
        let Some((key, value)) = line.split_once(':') else {
            return Err(error(line_num, "Expected 'KEY: VALUE' format"));
        };
        let key = key.trim();
        match document.object_at_mut(index) {
            Object::Sheet(sheet) => {
                let address = CellAddress::parse(key)
                    .map_err(|_| error(line_num, format!("Invalid cell reference: {}", key)))?;
                let cell = match parse_value(value, line_num)? {
                    Entry::Literal(value) => Cell::literal(value),
                    Entry::Formula(formula) => Cell {
                        content: CellContent::Formula(formula),
                    },
                };
                sheet.put_cell(address, cell);
            }
            Object::Feature(feature) => {
                if !is_identifier(key) {
                    return Err(error(line_num, format!("Invalid property name: {}", key)));
                }
                let property = feature.property_entry(key);
                match parse_value(value, line_num)? {
                    Entry::Literal(value) => property.set_value(value),
                    Entry::Formula(formula) => property.bind(formula),
                }
            }
        }
    }

    document.modified = false;
    Ok(document)
}

fn parse_section(header: &str, line_num: usize) -> Result<Object> {
    let mut parts = header.split_whitespace();
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some("sheet"), Some(name), None, None) => Ok(Object::Sheet(Sheet::new(name))),
        (Some("feature"), Some(name), Some(type_name), None) => {
            Ok(Object::Feature(Feature::new(name, type_name)))
        }
        _ => Err(error(
            line_num,
            format!("Invalid section header: [{}]", header),
        )),
    }
}

enum Entry {
    Literal(Value),
    Formula(Formula),
}

/// Parse a stored value: `=expr`, a quoted string, a number or a boolean.
fn parse_value(value: &str, line_num: usize) -> Result<Entry> {
    let value = value.trim();

    if value.is_empty() {
        return Ok(Entry::Literal(Value::Empty));
    }

    // Formula: starts with '='
    if value.starts_with('=') {
        let expression = Expression::parse(value)
            .map_err(|e| error(line_num, format!("Invalid expression: {}", e)))?;
        return Ok(Entry::Formula(Formula::new(expression, Value::Empty)));
    }

    // Quoted string: starts and ends with '"'
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        let text = &value[1..value.len() - 1];
        return Ok(Entry::Literal(Value::Text(unescape_text(text))));
    }

    if value.eq_ignore_ascii_case("true") {
        return Ok(Entry::Literal(Value::Bool(true)));
    }
    if value.eq_ignore_ascii_case("false") {
        return Ok(Entry::Literal(Value::Bool(false)));
    }

    if let Ok(n) = value.parse::<f64>() {
        return Ok(Entry::Literal(Value::Number(n)));
    }

    Err(error(
        line_num,
        format!("Invalid value: {}. Use quotes for text.", value),
    ))
}

/// Split off a qualifier ending at `delimiter`. Quoted qualifiers (`<<...>>`) may contain
/// the delimiter.
fn split_qualifier(input: &str, delimiter: char) -> Option<(String, &str)> {
    let input = input.trim_start();
    if let Some(quoted) = input.strip_prefix("<<") {
        let end = quoted.find(">>")?;
        let rest = quoted[end + 2..].trim_start().strip_prefix(delimiter)?;
        Some((quoted[..end].to_string(), rest))
    } else {
        let (qualifier, rest) = input.split_once(delimiter)?;
        Some((qualifier.trim().to_string(), rest))
    }
}

fn unquote_qualifier(input: &str) -> String {
    let input = input.trim();
    input
        .strip_prefix("<<")
        .and_then(|s| s.strip_suffix(">>"))
        .unwrap_or(input)
        .to_string()
}

/// Parse `docq#objq = docname#objname`.
fn parse_link(input: &str) -> Option<((String, String), (String, String))> {
    let (docq, rest) = split_qualifier(input, '#')?;
    let (objq, rest) = split_qualifier(rest, '=')?;
    let (docname, rest) = split_qualifier(rest, '#')?;
    let objname = unquote_qualifier(rest);
    if [&docq, &objq, &docname, &objname].iter().any(|s| s.is_empty()) {
        return None;
    }
    Some(((docq, objq), (docname, objname)))
}

fn unescape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some('n') => out.push('\n'),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a(text: &str) -> CellAddress {
        CellAddress::parse(text).unwrap()
    }

    #[test]
    fn test_parse_sheet_cells() {
        let content = r#"
# sheetbind document
[sheet Spreadsheet]
A1: 42
A2: "He said \"hi\""
A3: =A1 * 2
A4: TRUE
"#;
        let doc = parse_document_content(content, "doc").unwrap();
        let sheet = doc.sheet("Spreadsheet").unwrap();
        assert_eq!(sheet.cell(a("A1")).unwrap().value(), Value::Number(42.0));
        assert_eq!(
            sheet.cell(a("A2")).unwrap().value(),
            Value::Text("He said \"hi\"".to_string())
        );
        match &sheet.cell(a("A3")).unwrap().content {
            CellContent::Formula(f) => assert_eq!(f.source(), "A1 * 2"),
            other => panic!("Expected formula, got {:?}", other),
        }
        assert_eq!(sheet.cell(a("A4")).unwrap().value(), Value::Bool(true));
        assert!(!doc.modified);
    }

    #[test]
    fn test_parse_labels_aliases_and_features() {
        let content = r#"
@label Main Doc
[sheet Spreadsheet]
@label Params
A1: 10
@alias A1 width
[feature Box Part::Box]
@label My Box
Length: 10
Height: =Params.width
Empty:
"#;
        let doc = parse_document_content(content, "doc").unwrap();
        assert_eq!(doc.label(), "Main Doc");
        let sheet = doc.sheet("Params").unwrap();
        assert_eq!(sheet.name(), "Spreadsheet");
        assert_eq!(sheet.aliases().resolve("width").unwrap(), a("A1"));

        let feature = doc.feature("Box").unwrap();
        assert_eq!(feature.label(), "My Box");
        assert_eq!(feature.type_name(), "Part::Box");
        assert_eq!(feature.property("Length").unwrap().value(), Value::Number(10.0));
        assert_eq!(
            feature.property("Height").unwrap().binding().unwrap().source(),
            "Params.width"
        );
        assert_eq!(feature.property("Empty").unwrap().value(), Value::Empty);
    }

    #[test]
    fn test_parse_links() {
        let content = "@link <<Other Doc>>#Params = other#Spreadsheet\n@link d#<<a = b>> = d#S\n";
        let doc = parse_document_content(content, "doc").unwrap();
        assert_eq!(
            doc.links().get(&("Other Doc".to_string(), "Params".to_string())),
            Some(&("other".to_string(), "Spreadsheet".to_string()))
        );
        assert_eq!(
            doc.links().get(&("d".to_string(), "a = b".to_string())),
            Some(&("d".to_string(), "S".to_string()))
        );
    }

    #[test]
    fn test_rejects_unquotable_labels_and_bad_property_names() {
        let content = "[sheet S]\n@label a>>b\n";
        match parse_document_content(content, "doc") {
            Err(CoreError::Storage { line, .. }) => assert_eq!(line, 2),
            other => panic!("Expected storage error, got {:?}", other),
        }
        let content = "[feature Box Part::Box]\nLength: 1\nmy length: 2\n";
        match parse_document_content(content, "doc") {
            Err(CoreError::Storage { line, .. }) => assert_eq!(line, 3),
            other => panic!("Expected storage error, got {:?}", other),
        }
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        let content = "[sheet S]\nA1: 1\nA2: bare words\n";
        match parse_document_content(content, "doc") {
            Err(CoreError::Storage { line, .. }) => assert_eq!(line, 3),
            other => panic!("Expected storage error, got {:?}", other),
        }
        assert!(matches!(
            parse_document_content("A1: 1\n", "doc"),
            Err(CoreError::Storage { line: 1, .. })
        ));
        assert!(matches!(
            parse_document_content("[sheet S]\nA1: =1 +\n", "doc"),
            Err(CoreError::Storage { line: 2, .. })
        ));
    }

    #[test]
    fn test_ambiguous_alias_is_rejected() {
        let content = "[sheet S]\n@alias A1 x\n@alias B1 x\n";
        assert!(matches!(
            parse_document_content(content, "doc"),
            Err(CoreError::Storage { line: 3, .. })
        ));
    }
}
