//! Post-processing: line-oriented fixes applied to serialised Markdown.
//!
//! These rules run on the text produced by [`super::normalize`], never on the
//! tree: they care about where a line starts and which character sits before
//! a `[`, and both only exist once the document has been serialised.
//!
//! ## Rule Order
//!
//! 1. Promote headings (`#` → `##`, …, `######` → `#######`)
//! 2. Insert a space between a word and a link glued to it
//!
//! Rule 2 leaves fenced code blocks and backtick code spans alone.
//!
//! The two rules touch disjoint characters, so the order only matters for
//! readability of the output diff. Neither rule is idempotent: running
//! [`polish_markdown`] twice demotes headings twice.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

/// Apply all post-processing rules to serialised Markdown.
pub fn polish_markdown(input: &str) -> String {
    let s = promote_headings(input);
    space_before_links(&s)
}

// ── Rule 1: Heading-level promotion ──────────────────────────────────────────

// Anchored at line start; `#` anywhere else (code spans, URLs) is left alone.
static RE_HEADING_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}").unwrap());

/// Prepend one `#` to every line that starts with 1–6 of them.
///
/// No clamping: an H6 becomes a 7-`#` line, which CommonMark renders as
/// plain text.
pub fn promote_headings(input: &str) -> String {
    RE_HEADING_MARKER.replace_all(input, "#$0").into_owned()
}

// ── Rule 2: Space before links ───────────────────────────────────────────────

// Group 2 is a link opener: a bracketed label followed by `(` (inline link)
// or `[` (reference link). The character before it must not be whitespace
// (already spaced), `!` (an image), `\` (an escaped literal bracket) or `]`
// (the label half of a reference link). Start of line never matches.
static RE_GLUED_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([^\s!\\\]])(\[[^\]\n]*\][(\[])").unwrap());

/// `Word[link](url)` → `Word [link](url)`.
///
/// Fenced code blocks and backtick code spans are copied through untouched,
/// so `arr[0]` or `m[k](x)` inside code never gains a space.
pub fn space_before_links(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 16);
    let mut fence: Option<(char, usize)> = None;

    for line in input.split_inclusive('\n') {
        if let Some((ch, len)) = fence_marker(line) {
            match fence {
                None => fence = Some((ch, len)),
                Some((open_ch, open_len)) if ch == open_ch && len >= open_len => fence = None,
                Some(_) => {}
            }
            out.push_str(line);
        } else if fence.is_some() {
            out.push_str(line);
        } else {
            space_links_in_line(line, &mut out);
        }
    }
    out
}

/// Fence character and run length when `line` opens or closes a code fence
/// (three or more backticks or tildes, indented at most three spaces).
fn fence_marker(line: &str) -> Option<(char, usize)> {
    let body = line.trim_start_matches(' ');
    if line.len() - body.len() > 3 {
        return None;
    }
    let ch = body.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = body.chars().take_while(|c| *c == ch).count();
    (len >= 3).then_some((ch, len))
}

fn space_links_in_line(line: &str, out: &mut String) {
    let spans = code_spans(line);
    let mut last = 0;
    for caps in RE_GLUED_LINK.captures_iter(line) {
        let Some(link) = caps.get(2) else { continue };
        let at = link.start();
        if spans.iter().any(|span| span.contains(&at)) {
            continue;
        }
        out.push_str(&line[last..at]);
        out.push(' ');
        last = at;
    }
    out.push_str(&line[last..]);
}

/// Byte ranges of backtick code spans in one line. A run of N backticks
/// opens a span only if a later run of exactly N closes it.
fn code_spans(line: &str) -> Vec<Range<usize>> {
    let bytes = line.as_bytes();
    let run_end = |mut i: usize| {
        while i < bytes.len() && bytes[i] == b'`' {
            i += 1;
        }
        i
    };

    let mut spans = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }
        let open = i;
        i = run_end(i);
        let width = i - open;

        let mut j = i;
        while j < bytes.len() {
            if bytes[j] != b'`' {
                j += 1;
                continue;
            }
            let close = j;
            j = run_end(j);
            if j - close == width {
                spans.push(open..j);
                i = j;
                break;
            }
        }
    }
    spans
}

// ── Tests ────────────────────────────────────────────────────────────────────
