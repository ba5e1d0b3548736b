//! Conversion entry points.
//!
//! Two pipelines live here:
//!
//! - **HTML → Markdown** is pure and synchronous: [`html_to_markdown`] works
//!   on strings, [`convert_html_file`] adds the file I/O around it.
//! - **Markdown → PDF** validates and renders synchronously, then prints
//!   asynchronously because the browser is driven over a websocket.
//!   [`convert_markdown_to_pdf_sync`] wraps it for callers without a runtime.
//!
//! Every step that can fail does so before anything is written: the output
//! file only appears once the whole conversion has succeeded.

use crate::config::{Html2MdConfig, PdfConfig};
use crate::error::MdPressError;
use crate::output::{DocumentInfo, PdfOutput};
use crate::pipeline::frontmatter::{self, FrontmatterDocument};
use crate::pipeline::{input, normalize, pdf, postprocess, render};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

// ── HTML → Markdown ──────────────────────────────────────────────────────────

/// Convert an HTML document to Markdown with the default image directory.
///
/// # Example
/// ```rust
/// let md = mdpress::html_to_markdown("<h1>Title</h1><p>Hello\nworld</p>").unwrap();
/// assert!(md.contains("## Title"));
/// assert!(md.contains("Hello world"));
/// ```
pub fn html_to_markdown(html: &str) -> Result<String, MdPressError> {
    html_to_markdown_with(html, &Html2MdConfig::default())
}

/// Convert an HTML document to Markdown.
///
/// Tree fixes (images, links, paragraph breaks) run before serialisation;
/// text fixes (heading promotion, link spacing) run after it.
pub fn html_to_markdown_with(html: &str, config: &Html2MdConfig) -> Result<String, MdPressError> {
    let raw = normalize::html_to_raw_markdown(html, config).map_err(MdPressError::Serialization)?;
    Ok(postprocess::polish_markdown(&raw))
}

/// Convert an HTML file and write the Markdown next to it (or to `output`).
///
/// Returns the path written.
pub fn convert_html_file(
    input_path: impl AsRef<Path>,
    output: Option<&Path>,
    config: &Html2MdConfig,
) -> Result<PathBuf, MdPressError> {
    let start = Instant::now();
    let input_path = input_path.as_ref();
    info!("Converting {} to Markdown", input_path.display());

    let html = input::read_text(input_path)?;
    let markdown = html_to_markdown_with(&html, config)?;

    let out = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input::markdown_output_path(input_path));
    input::write_atomic(&out, markdown.as_bytes())?;

    info!(
        "Wrote {} ({} bytes) in {}ms",
        out.display(),
        markdown.len(),
        start.elapsed().as_millis()
    );
    Ok(out)
}

// ── Markdown → PDF ───────────────────────────────────────────────────────────

/// Read a Markdown file and run every pre-render check on it.
pub fn load_document(
    md_path: impl AsRef<Path>,
    config: &PdfConfig,
) -> Result<FrontmatterDocument, MdPressError> {
    let md_path = md_path.as_ref();
    let text = input::read_text(md_path)?;
    let doc = frontmatter::parse_document(&text)?;
    debug!(
        "{}: {} metadata keys, {} bytes of Markdown",
        md_path.display(),
        doc.metadata.len(),
        doc.content.len()
    );

    frontmatter::check_fields(&doc.metadata, &config.required_fields)?;
    frontmatter::check_content(&doc.content)?;
    Ok(doc)
}

/// Render a checked document through the template into a full HTML page.
pub fn render_document_html(
    template: impl AsRef<Path>,
    doc: &FrontmatterDocument,
) -> Result<String, MdPressError> {
    let rendered = render::markdown_to_html(&doc.content);
    render::render_template(template.as_ref(), doc, &rendered)
}

/// The PDF path named by the document's `pdf_filename`, under the base
/// directory.
pub fn pdf_output_path(
    doc: &FrontmatterDocument,
    config: &PdfConfig,
) -> Result<PathBuf, MdPressError> {
    let name = doc
        .metadata_str("pdf_filename")
        .filter(|n| !n.is_empty())
        .ok_or_else(|| MdPressError::MissingField {
            field: "pdf_filename".into(),
        })?;
    Ok(config.resolve_base_dir()?.join(name))
}

/// Convert a Markdown file to PDF using an HTML template.
///
/// # Example
/// ```rust,no_run
/// use mdpress::{convert_markdown_to_pdf, PdfConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let out = convert_markdown_to_pdf("template.html", "input.md", &PdfConfig::default()).await?;
/// println!("{} ({} bytes)", out.path.display(), out.bytes);
/// # Ok(())
/// # }
/// ```
pub async fn convert_markdown_to_pdf(
    template: impl AsRef<Path>,
    md_path: impl AsRef<Path>,
    config: &PdfConfig,
) -> Result<PdfOutput, MdPressError> {
    let md_path = md_path.as_ref();
    info!("Converting {} to PDF", md_path.display());

    let doc = load_document(md_path, config)?;
    let html = render_document_html(template, &doc)?;
    let output = pdf_output_path(&doc, config)?;
    pdf::render_pdf(&html, config, &output).await
}

/// Synchronous wrapper around [`convert_markdown_to_pdf`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_markdown_to_pdf_sync(
    template: impl AsRef<Path>,
    md_path: impl AsRef<Path>,
    config: &PdfConfig,
) -> Result<PdfOutput, MdPressError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| MdPressError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_markdown_to_pdf(template, md_path, config))
}

/// Render a Markdown file through the template and write the HTML page to
/// `output` instead of printing it.
pub fn convert_markdown_to_html(
    template: impl AsRef<Path>,
    md_path: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &PdfConfig,
) -> Result<PathBuf, MdPressError> {
    let doc = load_document(md_path, config)?;
    let html = render_document_html(template, &doc)?;
    let output = output.as_ref();
    input::write_atomic(output, html.as_bytes())?;
    info!("Wrote {} ({} bytes)", output.display(), html.len());
    Ok(output.to_path_buf())
}

/// Report a Markdown file's metadata and check results without rendering.
///
/// Only unreadable files and malformed frontmatter are errors; failed checks
/// are reported in the result.
pub fn inspect(md_path: impl AsRef<Path>, config: &PdfConfig) -> Result<DocumentInfo, MdPressError> {
    let text = input::read_text(md_path.as_ref())?;
    let doc = frontmatter::parse_document(&text)?;

    let missing_fields = config
        .required_fields
        .iter()
        .filter(|f| !doc.metadata.get(f.as_str()).is_some_and(frontmatter::is_truthy))
        .cloned()
        .collect();
    let heading_count = doc
        .content
        .lines()
        .filter(|l| l.trim().starts_with('#'))
        .count();

    Ok(DocumentInfo {
        word_count: doc.content.split_whitespace().count(),
        pdf_path: pdf_output_path(&doc, config).ok(),
        metadata: doc.metadata,
        missing_fields,
        heading_count,
    })
}
