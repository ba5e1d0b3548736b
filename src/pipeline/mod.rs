//! Pipeline stages for both conversions.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on plain strings without touching the filesystem or a browser.
//!
//! ## Data Flow
//!
//! ```text
//! html2md:  input ──▶ normalize ──▶ postprocess ──▶ input::write_atomic
//!           (read)    (tree + htmd)  (regex rules)
//!
//! md2pdf:   input ──▶ frontmatter ──▶ render ──▶ pdf
//!           (read)    (YAML + checks)  (HTML+TOC,  (headless
//!                                      template)   Chrome)
//! ```
//!
//! 1. [`input`]       — read UTF-8 files, derive output paths, write atomically
//! 2. [`normalize`]   — fix image paths, redirect links and paragraph breaks in
//!    the parsed tree, then serialise to Markdown
//! 3. [`postprocess`] — text rules that only make sense after serialisation
//!    (heading promotion, spacing before links)
//! 4. [`frontmatter`] — split YAML metadata from the body and validate both
//! 5. [`render`]      — Markdown → HTML with heading ids and a TOC, then the
//!    user's template
//! 6. [`pdf`]         — print the page with headless Chrome; the only stage
//!    with a child process

pub mod frontmatter;
pub mod input;
pub mod normalize;
pub mod pdf;
pub mod postprocess;
pub mod render;
