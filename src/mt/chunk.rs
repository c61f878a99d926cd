//! Paragraph-boundary chunking for long documents
//!
//! Long inputs are split at blank-line paragraph separators into pieces no
//! larger than a byte budget. Separators stay attached to the preceding
//! paragraph, so concatenating the chunks gives back the input exactly and
//! translated chunks can simply be joined in order.
//!
//! Placeholder tags are empty and never contain a line break. Heading
//! wrappers can (a literal may hold blank lines), so no boundary is placed
//! while an `<x-h2>`/`<x-h3>` element is still open.

use regex::Regex;
use std::sync::LazyLock;

/// Byte budget for one HTML translation request
pub const DEFAULT_HTML_CHUNK: usize = 30_000;

/// Byte budget for plain text (PDF) translation requests
pub const DEFAULT_TEXT_CHUNK: usize = 4_500;

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("paragraph break pattern"));

static WRAPPER_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<x-h[23][\s>]").expect("wrapper open pattern"));

static WRAPPER_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</x-h[23]\s*>").expect("wrapper close pattern"));

/// Split `text` into paragraphs, each keeping its trailing separator
fn paragraphs(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for m in PARAGRAPH_BREAK.find_iter(text) {
        pieces.push(&text[start..m.end()]);
        start = m.end();
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

/// Split `text` into chunks of whole paragraphs of at most `max_len` bytes
///
/// A single paragraph longer than `max_len` becomes a chunk of its own, and
/// so does a heading wrapper spanning several paragraphs.
/// `split_paragraphs(t, n).concat() == t` for every input.
pub fn split_paragraphs(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return if text.is_empty() {
            Vec::new()
        } else {
            vec![text.to_string()]
        };
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut open_wrappers = 0usize;
    for piece in paragraphs(text) {
        if open_wrappers == 0 && !current.is_empty() && current.len() + piece.len() > max_len {
            chunks.push(std::mem::take(&mut current));
        }
        current.push_str(piece);
        open_wrappers = (open_wrappers + WRAPPER_OPEN.find_iter(piece).count())
            .saturating_sub(WRAPPER_CLOSE.find_iter(piece).count());
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_single_chunk() {
        assert_eq!(split_paragraphs("hello", 100), vec!["hello"]);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(split_paragraphs("", 100).is_empty());
    }

    #[test]
    fn test_splits_at_paragraphs() {
        let text = "aaaa\n\nbbbb\n\ncccc";
        let chunks = split_paragraphs(text, 12);
        assert_eq!(chunks, vec!["aaaa\n\nbbbb\n\n", "cccc"]);
    }

    #[test]
    fn test_concat_is_lossless() {
        let text = "first para\n\n\n  \nsecond\r\n\r\nthird line\nstill third\n\nlast\n";
        for max in [1, 5, 12, 20, 1000] {
            assert_eq!(split_paragraphs(text, max).concat(), text);
        }
    }

    #[test]
    fn test_oversize_paragraph_kept_whole() {
        let long = "x".repeat(50);
        let text = format!("a\n\n{}\n\nb", long);
        let chunks = split_paragraphs(&text, 10);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].starts_with(&long));
    }

    #[test]
    fn test_boundaries_never_split_placeholder_tags() {
        let tag = r#"<x-jinja data-k="J000001"></x-jinja>"#;
        let text = format!("<p>One {tag}</p>\n\n<p>Two {tag}</p>\n\n<p>Three</p>");
        for chunk in split_paragraphs(&text, 40) {
            assert_eq!(chunk.matches("<x-jinja").count(), chunk.matches("</x-jinja>").count());
        }
    }

    #[test]
    fn test_boundaries_never_split_heading_wrappers() {
        let filler = format!("<p>{}</p>\n\n", "a".repeat(29_950));
        let text = format!(
            "{filler}<h2><x-h2 data-k=\"H000000\">Line one\n\nLine two</x-h2></h2>\n\n<p>tail</p>"
        );
        let chunks = split_paragraphs(&text, DEFAULT_HTML_CHUNK);

        assert_eq!(chunks.concat(), text);
        assert_eq!(chunks.len(), 2);
        for chunk in &chunks {
            assert_eq!(
                WRAPPER_OPEN.find_iter(chunk).count(),
                WRAPPER_CLOSE.find_iter(chunk).count()
            );
        }
        assert!(chunks[0].ends_with("Line one\n\nLine two</x-h2></h2>\n\n"));
        assert_eq!(chunks[1], "<p>tail</p>");
    }
}
