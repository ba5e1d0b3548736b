//! Rendering: Markdown body → HTML fragment with linked headings, then the
//! fragment and metadata → full HTML page via the user's template.
//!
//! ## Heading ids
//!
//! Every heading gets an `id` derived from its text so the table of contents
//! (and PDF bookmarks) can link to it:
//!
//! | Heading | id |
//! |---|---|
//! | `Test Content` | `test-content` |
//! | `What's new?` | `whats-new` |
//! | `Test Content` (again) | `test-content_1` |
//! | `???` | `section` |
//!
//! ## Templates
//!
//! Templates use Jinja-style syntax (`{{ title }}`, `{% if toc %}`) rendered by
//! Tera. The context holds every frontmatter key plus `content` and `toc`.
//! Autoescaping is off: `content` and `toc` are already HTML.

use crate::error::MdPressError;
use crate::pipeline::frontmatter::FrontmatterDocument;
use once_cell::sync::Lazy;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use tera::{Context, Tera};
use tracing::{debug, warn};

/// Name the template is registered under inside the Tera instance.
const TEMPLATE_NAME: &str = "document";

/// A rendered Markdown body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedHtml {
    /// Body HTML with `id` attributes on every heading.
    pub content: String,
    /// Nested `<div class="toc">` list linking to every heading.
    pub toc: String,
}

/// One table-of-contents entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub level: u8,
    pub id: String,
    pub text: String,
}

// ── Markdown → HTML ──────────────────────────────────────────────────────────

/// Render Markdown (CommonMark + tables) to HTML and build its TOC.
pub fn markdown_to_html(markdown: &str) -> RenderedHtml {
    let mut events: Vec<Event> = Parser::new_ext(markdown, Options::ENABLE_TABLES).collect();
    let mut slugs = SlugRegistry::default();
    let mut entries = Vec::new();

    for i in 0..events.len() {
        let level = match &events[i] {
            Event::Start(Tag::Heading { level, .. }) => *level,
            _ => continue,
        };
        let text = heading_text(&events[i + 1..]);
        let slug = slugs.unique(slugify(&text));
        if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
            *id = Some(CowStr::from(slug.clone()));
        }
        entries.push(TocEntry {
            level: level as u8,
            id: slug,
            text,
        });
    }

    let mut content = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut content, events.into_iter());
    debug!("Rendered {} bytes of HTML, {} headings", content.len(), entries.len());

    RenderedHtml {
        content,
        toc: build_toc(&entries),
    }
}

/// Plain text of a heading, from the events following its start tag.
fn heading_text(events: &[Event]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::End(TagEnd::Heading(_)) => break,
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            _ => {}
        }
    }
    text
}

// ── Slugs ────────────────────────────────────────────────────────────────────

static RE_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").unwrap());

/// Lowercase, drop punctuation, and join words with single dashes.
pub fn slugify(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_' || *c == '-')
        .collect::<String>()
        .to_lowercase();
    RE_SEPARATORS.replace_all(kept.trim(), "-").into_owned()
}

#[derive(Debug, Default)]
struct SlugRegistry {
    used: HashSet<String>,
}

impl SlugRegistry {
    fn unique(&mut self, slug: String) -> String {
        let base = if slug.is_empty() {
            "section".to_string()
        } else {
            slug
        };
        let mut candidate = base.clone();
        let mut n = 0;
        while self.used.contains(&candidate) {
            n += 1;
            candidate = format!("{base}_{n}");
        }
        self.used.insert(candidate.clone());
        candidate
    }
}

// ── Table of contents ────────────────────────────────────────────────────────

/// Nested list of links following heading levels. A deeper heading opens a
/// sub-list inside the previous entry; a shallower one closes back out.
pub fn build_toc(entries: &[TocEntry]) -> String {
    let mut out = String::from("<div class=\"toc\">\n<ul>\n");
    let mut open: Vec<u8> = Vec::new();

    for entry in entries {
        if let Some(&top) = open.last() {
            if entry.level > top {
                out.push_str("\n<ul>\n");
            } else {
                out.push_str("</li>\n");
                open.pop();
                while let Some(&parent) = open.last() {
                    if entry.level > parent {
                        break;
                    }
                    out.push_str("</ul>\n</li>\n");
                    open.pop();
                }
            }
        }
        out.push_str(&format!(
            "<li><a href=\"#{}\">{}</a>",
            entry.id,
            html_escape::encode_text(&entry.text)
        ));
        open.push(entry.level);
    }

    if !open.is_empty() {
        out.push_str("</li>\n");
        open.pop();
    }
    while open.pop().is_some() {
        out.push_str("</ul>\n</li>\n");
    }
    out.push_str("</ul>\n</div>\n");
    out
}

// ── Template ─────────────────────────────────────────────────────────────────

/// Render the template file with the document's metadata and rendered body.
pub fn render_template(
    template_path: &Path,
    doc: &FrontmatterDocument,
    rendered: &RenderedHtml,
) -> Result<String, MdPressError> {
    if !template_path.is_file() {
        return Err(MdPressError::TemplateNotFound {
            path: template_path.to_path_buf(),
        });
    }
    let render_err = |e: tera::Error| MdPressError::TemplateRender {
        path: template_path.to_path_buf(),
        detail: error_chain(&e),
    };

    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    tera.add_template_file(template_path, Some(TEMPLATE_NAME))
        .map_err(render_err)?;

    let mut context = Context::new();
    for (key, value) in &doc.metadata {
        match key.as_str() {
            Some(key) => context.insert(key, value),
            None => warn!("Skipping non-string metadata key {:?}", key),
        }
    }
    context.insert("content", &rendered.content);
    context.insert("toc", &rendered.toc);

    tera.render(TEMPLATE_NAME, &context).map_err(render_err)
}

/// Tera reports the useful part (the failing variable or filter) in the
/// error's source chain, not its top-level message.
fn error_chain(e: &tera::Error) -> String {
    let mut msg = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}
