//! YAML frontmatter: split a Markdown file into metadata and body, then check
//! both before anything is rendered.
//!
//! A document looks like:
//!
//! ```text
//! ---
//! title: Release notes
//! version: 1.0
//! date_modified: 2024-12-04
//! pdf_filename: notes.pdf
//! ---
//! # Release notes
//! ...
//! ```
//!
//! Files without a leading `---` line are accepted as body-only documents
//! with empty metadata; they then fail the required-field check rather than
//! the parser.

use crate::error::MdPressError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::{Mapping, Value};

/// A parsed Markdown document.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontmatterDocument {
    /// Frontmatter keys in file order.
    pub metadata: Mapping,
    /// Markdown body, trimmed.
    pub content: String,
}

impl FrontmatterDocument {
    /// A metadata value rendered as plain text, for scalar values only.
    pub fn metadata_str(&self, key: &str) -> Option<String> {
        match self.metadata.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

static RE_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-{3,}\s*$").unwrap());

/// Split `text` into `(yaml, body)`.
///
/// `yaml` is `None` unless the trimmed text opens with a boundary line and a
/// second boundary line closes the header.
pub fn split_frontmatter(text: &str) -> (Option<&str>, &str) {
    let text = text.trim();
    let mut lines = text.split_inclusive('\n');

    match lines.next() {
        Some(first) if RE_BOUNDARY.is_match(first.trim_end_matches('\n')) => {}
        _ => return (None, text),
    }

    let yaml_start = first_line_len(text);
    let mut offset = yaml_start;
    for line in lines {
        if RE_BOUNDARY.is_match(line.trim_end_matches('\n')) {
            let yaml = &text[yaml_start..offset];
            let body = &text[offset + line.len()..];
            return (Some(yaml), body);
        }
        offset += line.len();
    }
    (None, text)
}

fn first_line_len(text: &str) -> usize {
    text.find('\n').map_or(text.len(), |i| i + 1)
}

/// Parse a whole file into metadata and body.
pub fn parse_document(text: &str) -> Result<FrontmatterDocument, MdPressError> {
    let (yaml, body) = split_frontmatter(text);
    let metadata = match yaml {
        Some(yaml) => parse_metadata(yaml)?,
        None => Mapping::new(),
    };
    Ok(FrontmatterDocument {
        metadata,
        content: body.trim().to_string(),
    })
}

fn parse_metadata(yaml: &str) -> Result<Mapping, MdPressError> {
    if yaml.trim().is_empty() {
        return Ok(Mapping::new());
    }
    let value: Value = serde_yaml::from_str(yaml).map_err(|e| MdPressError::FrontmatterInvalid {
        detail: e.to_string(),
    })?;
    match value {
        Value::Mapping(m) => Ok(m),
        Value::Null => Ok(Mapping::new()),
        other => Err(MdPressError::FrontmatterInvalid {
            detail: format!("expected key: value pairs, found {}", value_kind(&other)),
        }),
    }
}

fn value_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Whether a metadata value counts as present. Null, `false`, zero, and empty
/// strings, lists and mappings do not.
pub fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Sequence(s) => !s.is_empty(),
        Value::Mapping(m) => !m.is_empty(),
        Value::Tagged(t) => is_truthy(&t.value),
    }
}

/// Fail on the first required key that is absent or empty.
pub fn check_fields<S: AsRef<str>>(metadata: &Mapping, required: &[S]) -> Result<(), MdPressError> {
    for field in required {
        let field = field.as_ref();
        if !metadata.get(field).is_some_and(is_truthy) {
            return Err(MdPressError::MissingField {
                field: field.to_string(),
            });
        }
    }
    Ok(())
}

/// The body must be non-empty and contain at least one heading line.
pub fn check_content(content: &str) -> Result<(), MdPressError> {
    if content.is_empty() {
        return Err(MdPressError::EmptyContent);
    }
    if !content.lines().any(|line| line.trim().starts_with('#')) {
        return Err(MdPressError::MissingTitle);
    }
    Ok(())
}
