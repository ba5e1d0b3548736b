//! HTML normalisation: fix export artefacts in the document tree, then
//! serialise it to Markdown.
//!
//! ## Why mutate the tree instead of the Markdown?
//!
//! Image sources, link targets and paragraph boundaries are unambiguous in
//! the parsed tree and ambiguous in Markdown text (a `\n` inside a paragraph
//! looks just like one between blocks). So these three fixes run on the DOM,
//! before serialisation; only the purely line-oriented fixes in
//! [`super::postprocess`] run on the text afterwards.
//!
//! ## Pass order
//!
//! 1. Rewrite `<img src>` to `<image_dir>/<basename>`
//! 2. Unwrap redirect links (`…?q=https://real/target&…`)
//! 3. Replace line breaks inside `<p>` text with spaces
//! 4. Serialise to ATX-style Markdown
//!
//! Every pass is a no-op when its precondition is missing (no `src`, no `q`
//! parameter, no paragraphs); none of them can fail.

use crate::config::Html2MdConfig;
use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::serialize::{serialize, SerializeOpts};
use html5ever::tendril::{StrTendril, TendrilSink};
use htmd::options::{HeadingStyle, Options};
use htmd::HtmlToMarkdown;
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Run passes 1–4 over raw HTML and return the serialised Markdown.
pub fn html_to_raw_markdown(html: &str, config: &Html2MdConfig) -> std::io::Result<String> {
    let dom = parse_html(html);

    let images = rewrite_image_sources(&dom.document, &config.image_dir);
    let links = clean_link_targets(&dom.document);
    let texts = collapse_paragraph_breaks(&dom.document);
    debug!(
        "Normalised tree: {} image sources, {} link targets, {} paragraph text nodes",
        images, links, texts
    );

    let normalised = serialize_dom(&dom)?;
    markdown_converter().convert(&normalised)
}

/// Parse a full HTML document into an owned, mutable tree.
pub fn parse_html(html: &str) -> RcDom {
    parse_document(RcDom::default(), ParseOpts::default()).one(html)
}

/// Serialise the (mutated) tree back to HTML text.
pub fn serialize_dom(dom: &RcDom) -> std::io::Result<String> {
    let mut buf = Vec::new();
    let handle = SerializableHandle::from(dom.document.clone());
    serialize(&mut buf, &handle, SerializeOpts::default())?;
    String::from_utf8(buf).map_err(std::io::Error::other)
}

/// htmd converter emitting `#`-style headings. `<head>`, scripts and styles
/// carry no document prose and are dropped.
fn markdown_converter() -> HtmlToMarkdown {
    HtmlToMarkdown::builder()
        .options(Options {
            heading_style: HeadingStyle::Atx,
            ..Default::default()
        })
        .skip_tags(vec!["head", "script", "style"])
        .build()
}

// ── Pass 1: Image path rewrite ───────────────────────────────────────────────

/// Rewrite every non-empty `<img src>` in place. Returns the number rewritten.
pub fn rewrite_image_sources(root: &Handle, image_dir: &str) -> usize {
    elements_named(root, "img")
        .iter()
        .filter(|img| update_attr(img, "src", |src| rewrite_image_src(src, image_dir)))
        .count()
}

/// `"<any>/<dirs>/photo.png"` → `"<image_dir>/photo.png"`. Empty sources are
/// left alone.
pub fn rewrite_image_src(src: &str, image_dir: &str) -> Option<String> {
    if src.is_empty() {
        return None;
    }
    let base = image_basename(src);
    let dir = image_dir.trim_end_matches('/');
    if dir.is_empty() {
        Some(base.to_string())
    } else {
        Some(format!("{dir}/{base}"))
    }
}

/// Final `/`-delimited segment. Purely syntactic: the file need not exist.
pub fn image_basename(src: &str) -> &str {
    src.rsplit('/').next().unwrap_or(src)
}

// ── Pass 2: Link target cleanup ──────────────────────────────────────────────

// `q` must be a whole parameter name (`?q=` or `&q=`), and its value must
// look like an absolute URL. The capture runs to the next `&`, undecoded.
static RE_REDIRECT_TARGET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[?&]q=([A-Za-z][A-Za-z0-9+.\-]*://[^&]+)")
        .expect("RE_REDIRECT_TARGET: hardcoded regex is valid")
});

/// Replace every redirect-wrapped `<a href>` with its real target. Returns the
/// number of links changed.
pub fn clean_link_targets(root: &Handle) -> usize {
    elements_named(root, "a")
        .iter()
        .filter(|a| update_attr(a, "href", |href| redirect_target(href).map(str::to_string)))
        .count()
}

/// The destination wrapped in a `q=<url>` parameter, if there is one.
pub fn redirect_target(url: &str) -> Option<&str> {
    RE_REDIRECT_TARGET
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

// ── Pass 3: Paragraph line-break collapsing ──────────────────────────────────

/// Replace `\n`/`\r` with spaces in every text node under a `<p>`. Returns the
/// number of text nodes changed.
pub fn collapse_paragraph_breaks(root: &Handle) -> usize {
    let mut changed = 0;
    for p in elements_named(root, "p") {
        for node in descendants(&p) {
            if let NodeData::Text { contents } = &node.data {
                let mut contents = contents.borrow_mut();
                if contents.contains(['\n', '\r']) {
                    let collapsed = collapse_line_breaks(&contents);
                    *contents = StrTendril::from_slice(&collapsed);
                    changed += 1;
                }
            }
        }
    }
    changed
}

/// Each line-feed and carriage-return becomes exactly one space.
pub fn collapse_line_breaks(text: &str) -> String {
    text.replace(['\n', '\r'], " ")
}

// ── Tree helpers ─────────────────────────────────────────────────────────────

fn element_name(node: &Handle) -> Option<&str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(&*name.local),
        _ => None,
    }
}

/// Pre-order list of `root` and everything below it.
fn descendants(root: &Handle) -> Vec<Handle> {
    let mut out = Vec::new();
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        stack.extend(node.children.borrow().iter().rev().cloned());
        out.push(node);
    }
    out
}

fn elements_named(root: &Handle, tag: &str) -> Vec<Handle> {
    descendants(root)
        .into_iter()
        .filter(|n| element_name(n) == Some(tag))
        .collect()
}

/// Apply `f` to the attribute's current value; if it returns a new value,
/// store it. Returns whether the attribute was changed.
fn update_attr(node: &Handle, attr_name: &str, f: impl FnOnce(&str) -> Option<String>) -> bool {
    let NodeData::Element { attrs, .. } = &node.data else {
        return false;
    };
    let mut attrs = attrs.borrow_mut();
    let Some(attr) = attrs.iter_mut().find(|a| &*a.name.local == attr_name) else {
        return false;
    };
    match f(&attr.value) {
        Some(new_value) => {
            attr.value = StrTendril::from_slice(&new_value);
            true
        }
        None => false,
    }
}

#[cfg(test)]
fn attr_value(node: &Handle, attr_name: &str) -> Option<String> {
    let NodeData::Element { attrs, .. } = &node.data else {
        return None;
    };
    let attrs = attrs.borrow();
    attrs
        .iter()
        .find(|a| &*a.name.local == attr_name)
        .map(|a| a.value.to_string())
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn first(dom: &RcDom, tag: &str) -> Handle {
        elements_named(&dom.document, tag)
            .into_iter()
            .next()
            .unwrap_or_else(|| panic!("no <{tag}> in document"))
    }

    fn text_of(node: &Handle) -> String {
        descendants(node)
            .iter()
            .filter_map(|n| match &n.data {
                NodeData::Text { contents } => Some(contents.borrow().to_string()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_image_basename() {
        assert_eq!(image_basename("/a/b/c.jpg"), "c.jpg");
        assert_eq!(image_basename("photo.png"), "photo.png");
        assert_eq!(image_basename("https://cdn.example.org/x/y.gif"), "y.gif");
        assert_eq!(image_basename("dir/"), "");
    }

    #[test]
    fn test_rewrite_image_src() {
        assert_eq!(
            rewrite_image_src("Export_files/photo.png", "images").as_deref(),
            Some("images/photo.png")
        );
        assert_eq!(
            rewrite_image_src("photo.png", "assets/").as_deref(),
            Some("assets/photo.png")
        );
        assert_eq!(rewrite_image_src("photo.png", "").as_deref(), Some("photo.png"));
        assert_eq!(rewrite_image_src("", "images"), None);
    }

    #[test]
    fn test_rewrite_image_sources_in_tree() {
        let dom = parse_html(r#"<img src="/some/where/photo.png"><img alt="no source">"#);
        assert_eq!(rewrite_image_sources(&dom.document, "images"), 1);

        let imgs = elements_named(&dom.document, "img");
        assert_eq!(attr_value(&imgs[0], "src").as_deref(), Some("images/photo.png"));
        assert_eq!(attr_value(&imgs[1], "src"), None);
        assert_eq!(attr_value(&imgs[1], "alt").as_deref(), Some("no source"));
    }

    #[test]
    fn test_redirect_target() {
        assert_eq!(
            redirect_target("https://www.google.com/url?q=https://example.com/page&other=1"),
            Some("https://example.com/page")
        );
        assert_eq!(
            redirect_target("https://www.google.com/url?sa=D&q=http://x.org/a?b"),
            Some("http://x.org/a?b")
        );
        assert_eq!(redirect_target("https://example.com/plain"), None);
        // `q` must be its own parameter, and its value a URL.
        assert_eq!(redirect_target("https://s.example/?faq=https://x.org"), None);
        assert_eq!(redirect_target("https://s.example/?q=rust+books"), None);
    }

    #[test]
    fn test_redirect_target_not_percent_decoded() {
        assert_eq!(
            redirect_target("https://google.com/url?q=https://x.com/a%20b&sa=D"),
            Some("https://x.com/a%20b")
        );
    }

    #[test]
    fn test_clean_link_targets_in_tree() {
        let dom = parse_html(
            r#"<a href="https://www.google.com/url?q=https://example.com/page&amp;other=1">x</a>
               <a href="https://example.com/untouched">y</a>
               <a name="anchor">z</a>"#,
        );
        assert_eq!(clean_link_targets(&dom.document), 1);

        let links = elements_named(&dom.document, "a");
        assert_eq!(attr_value(&links[0], "href").as_deref(), Some("https://example.com/page"));
        assert_eq!(
            attr_value(&links[1], "href").as_deref(),
            Some("https://example.com/untouched")
        );
        assert_eq!(attr_value(&links[2], "href"), None);
    }

    #[test]
    fn test_collapse_line_breaks() {
        assert_eq!(collapse_line_breaks("Hello\nWorld\r\n!"), "Hello World  !");
        assert_eq!(collapse_line_breaks("a\n\n\nb"), "a   b");
        assert_eq!(collapse_line_breaks("no breaks"), "no breaks");
    }

    #[test]
    fn test_collapse_only_inside_paragraphs() {
        let dom = parse_html("<h1>Title\nLine</h1><p>A\n<em>B\nC</em></p><pre>x\ny</pre>");
        assert_eq!(collapse_paragraph_breaks(&dom.document), 2);

        assert_eq!(text_of(&first(&dom, "p")), "A B C");
        assert_eq!(text_of(&first(&dom, "h1")), "Title\nLine");
        assert_eq!(text_of(&first(&dom, "pre")), "x\ny");
    }

    #[test]
    fn test_serialize_roundtrip_keeps_mutations() {
        let dom = parse_html(r#"<p>one</p><img src="a/b.png">"#);
        rewrite_image_sources(&dom.document, "images");
        let html = serialize_dom(&dom).unwrap();
        assert!(html.contains(r#"src="images/b.png""#), "got: {html}");
        assert!(html.contains("<p>one</p>"));
    }

    #[test]
    fn test_raw_markdown_uses_atx_headings() {
        let md = html_to_raw_markdown(
            "<h1>Title</h1><h2>Sub</h2><p>Body</p>",
            &Html2MdConfig::default(),
        )
        .unwrap();
        assert!(md.contains("# Title"), "got: {md}");
        assert!(md.contains("## Sub"), "got: {md}");
        assert!(!md.contains("====="));
    }

    #[test]
    fn test_raw_markdown_drops_scripts() {
        let md = html_to_raw_markdown(
            "<html><head><title>T</title><style>p{}</style></head><body><p>Body</p><script>evil()</script></body></html>",
            &Html2MdConfig::default(),
        )
        .unwrap();
        assert!(md.contains("Body"));
        assert!(!md.contains("evil"));
        assert!(!md.contains("p{}"));
    }
}
