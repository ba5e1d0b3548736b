//! Result types returned by the conversion entry points.

use serde::Serialize;
use std::path::PathBuf;

/// Result of a successful Markdown → PDF print.
#[derive(Debug, Clone, Serialize)]
pub struct PdfOutput {
    /// Where the PDF was written.
    pub path: PathBuf,
    /// Size of the PDF in bytes.
    pub bytes: usize,
    /// Wall-clock time for launch, load and print, in milliseconds.
    pub duration_ms: u64,
}

/// What [`crate::inspect`] learns about a Markdown document without
/// rendering it.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    /// Frontmatter as parsed, in file order.
    pub metadata: serde_yaml::Mapping,
    /// Required fields that are absent or empty.
    pub missing_fields: Vec<String>,
    /// Heading lines found in the body.
    pub heading_count: usize,
    /// Whitespace-separated words in the body.
    pub word_count: usize,
    /// Where the PDF would be written, if `pdf_filename` is set.
    pub pdf_path: Option<PathBuf>,
}

impl DocumentInfo {
    /// True when the document would pass every pre-render check.
    pub fn is_printable(&self) -> bool {
        self.missing_fields.is_empty() && self.heading_count > 0
    }
}
