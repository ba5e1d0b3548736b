//! Error types for the mdpress library.
//!
//! Every failure is fatal: the CLIs print the message and exit non-zero, and
//! nothing is written to the output path. The HTML → Markdown normalisation
//! passes themselves never fail; they degrade to no-ops on malformed input.
//! The only error they can surface is an I/O failure of the in-memory
//! serialiser.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the mdpress library.
#[derive(Debug, Error)]
pub enum MdPressError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file was read but is not valid UTF-8 text.
    #[error("Input file '{path}' is not valid UTF-8: {detail}")]
    NotUtf8 { path: PathBuf, detail: String },

    /// Any other read failure.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Frontmatter errors ────────────────────────────────────────────────
    /// The YAML header could not be parsed, or is not a mapping.
    #[error("Invalid YAML frontmatter: {detail}")]
    FrontmatterInvalid { detail: String },

    /// A required metadata key is absent or empty.
    #[error("Metadata field '{field}' is missing or empty.")]
    MissingField { field: String },

    /// The Markdown body is empty.
    #[error("Markdown content not present.")]
    EmptyContent,

    /// The Markdown body has no heading line at all.
    #[error("Suspiciously, the Markdown content does not contain a title.")]
    MissingTitle,

    // ── Render errors ─────────────────────────────────────────────────────
    /// HTML could not be serialised back out for Markdown conversion.
    #[error("Markdown serialisation failed: {0}")]
    Serialization(#[source] std::io::Error),

    /// The HTML template file does not exist.
    #[error("Template not found: '{path}'")]
    TemplateNotFound { path: PathBuf },

    /// The template engine rejected the template or failed while rendering.
    #[error("Failed to render template '{path}': {detail}")]
    TemplateRender { path: PathBuf, detail: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// No browser could be found to print the PDF.
    #[error("Cannot print PDF: {0}")]
    BrowserNotFound(#[from] chrome_locate::ChromeLocateError),

    /// Chrome failed to launch, load the page, or print it.
    #[error("PDF rendering failed: {detail}")]
    PdfRenderFailed { detail: String },

    /// Printing did not finish within the configured timeout.
    #[error("PDF rendering timed out after {secs}s\nIncrease --timeout.")]
    PdfTimeout { secs: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
