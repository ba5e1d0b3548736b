//! # mdpress
//!
//! Two single-file document converters:
//!
//! - **HTML → Markdown** for documents exported from online editors, whose
//!   HTML carries redirect-wrapped links, deep image paths and hard-wrapped
//!   paragraphs.
//! - **Markdown → PDF** for documents with a YAML frontmatter header, printed
//!   through an HTML/CSS template with a linked table of contents.
//!
//! ## Pipeline Overview
//!
//! ```text
//! HTML                                   Markdown + YAML frontmatter
//!  │                                      │
//!  ├─ 1. Parse     html5ever tree         ├─ 1. Split     frontmatter / body
//!  ├─ 2. Images    src → images/<name>    ├─ 2. Check     required fields, title
//!  ├─ 3. Links     unwrap ?q=<url>        ├─ 3. Render    pulldown-cmark + TOC
//!  ├─ 4. Breaks    \n in <p> → space      ├─ 4. Template  Tera (Jinja syntax)
//!  ├─ 5. Serialise htmd, ATX headings     └─ 5. Print     headless Chrome
//!  └─ 6. Polish    demote headings,
//!                  space before links
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mdpress::{convert_html_file, convert_markdown_to_pdf, Html2MdConfig, PdfConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let md = convert_html_file("export.html", None, &Html2MdConfig::default())?;
//!     println!("Markdown file created at: {}", md.display());
//!
//!     let pdf = convert_markdown_to_pdf("template.html", "input.md", &PdfConfig::default()).await?;
//!     eprintln!("{} bytes in {}ms", pdf.bytes, pdf.duration_ms);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `html2md` and `md2pdf` binaries (clap + anyhow + indicatif + tracing-subscriber + serde_json) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! mdpress = { version = "0.1", default-features = false }
//! ```
//!
//! ## Printing requirements
//!
//! PDF output needs a local Chrome or Chromium. It is found through
//! `CHROME_PATH`, the usual install locations, or `PATH`; see the
//! `chrome-locate` crate.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{Html2MdConfig, PageFormat, PdfConfig, PdfConfigBuilder, REQUIRED_FIELDS};
pub use convert::{
    convert_html_file, convert_markdown_to_html, convert_markdown_to_pdf,
    convert_markdown_to_pdf_sync, html_to_markdown, html_to_markdown_with, inspect, load_document,
    pdf_output_path, render_document_html,
};
pub use error::MdPressError;
pub use output::{DocumentInfo, PdfOutput};
pub use pipeline::frontmatter::FrontmatterDocument;
pub use pipeline::render::RenderedHtml;
