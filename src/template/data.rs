//! Core data structures for masking a template
//!
//! All of these live for a single translation invocation: they are created
//! while preparing a document, carried alongside the masked text through the
//! vendor call and consumed when the translated text is restored.

use crate::template::escape::escape_html_text;

/// Prefix of generic placeholder keys (`J000007`)
pub const PLACEHOLDER_KEY_PREFIX: char = 'J';

/// Prefix of heading wrapper keys (`H000003`)
pub const HEADING_KEY_PREFIX: char = 'H';

fn sequential_key(prefix: char, index: usize) -> String {
    format!("{}{:06}", prefix, index)
}

fn key_index(prefix: char, key: &str) -> Option<usize> {
    let digits = key.strip_prefix(prefix)?;
    if digits.len() < 6 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Ordered mapping from placeholder key to the exact source text it replaced
///
/// Keys are allocated sequentially in discovery order, so iteration order is
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderMap {
    originals: Vec<String>,
}

impl PlaceholderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `original` under a freshly allocated key and return the key
    pub fn insert(&mut self, original: String) -> String {
        let key = sequential_key(PLACEHOLDER_KEY_PREFIX, self.originals.len());
        self.originals.push(original);
        key
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        let index = key_index(PLACEHOLDER_KEY_PREFIX, key)?;
        self.originals.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.originals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.originals.is_empty()
    }

    /// `(key, original)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (String, &str)> {
        self.originals
            .iter()
            .enumerate()
            .map(|(i, original)| (sequential_key(PLACEHOLDER_KEY_PREFIX, i), original.as_str()))
    }
}

/// Heading macro level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    Two,
    Three,
}

impl HeadingLevel {
    pub fn from_digit(digit: &str) -> Option<Self> {
        match digit {
            "2" => Some(HeadingLevel::Two),
            "3" => Some(HeadingLevel::Three),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            HeadingLevel::Two => 2,
            HeadingLevel::Three => 3,
        }
    }

    /// Macro name in the template (`heading2`)
    pub fn macro_name(self) -> String {
        format!("heading{}", self.number())
    }

    /// Inert wrapper element name (`x-h2`)
    pub fn tag_name(self) -> String {
        format!("x-h{}", self.number())
    }
}

/// A `headingN("literal")` call that was replaced by a wrapper tag
///
/// Keeps the exact call syntax around the literal so the call can be rebuilt
/// with the original spacing and quote style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingCall {
    pub level: HeadingLevel,
    /// Source text from the opening braces up to the literal, e.g. `{{ heading2(`
    pub prefix: String,
    /// Source text after the literal, e.g. `) }}`
    pub suffix: String,
    /// The literal token as written, quotes and escapes included
    pub token: String,
    /// The unescaped literal content
    pub content: String,
}

impl HeadingCall {
    pub fn quote(&self) -> char {
        self.token.chars().next().unwrap_or('"')
    }

    /// Wrapper element carrying `key` and the HTML-escaped content
    pub fn wrapper_tag(&self, key: &str) -> String {
        let tag = self.level.tag_name();
        format!(
            r#"<{tag} data-k="{key}">{}</{tag}>"#,
            escape_html_text(&self.content)
        )
    }
}

/// Ordered registry of wrapped heading calls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadingCalls {
    calls: Vec<HeadingCall>,
}

impl HeadingCalls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, call: HeadingCall) -> String {
        let key = sequential_key(HEADING_KEY_PREFIX, self.calls.len());
        self.calls.push(call);
        key
    }

    pub fn get(&self, key: &str) -> Option<&HeadingCall> {
        self.calls.get(key_index(HEADING_KEY_PREFIX, key)?)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

/// A quoted string literal found inside a non-literal heading argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralSpan {
    /// Byte offset of the opening quote in the document
    pub start: usize,
    /// Byte offset just past the closing quote
    pub end: usize,
    /// The literal token as written
    pub token: String,
    /// The unescaped content sent for translation
    pub content: String,
}

impl LiteralSpan {
    pub fn quote(&self) -> char {
        self.token.chars().next().unwrap_or('"')
    }
}

/// A template prepared for the vendor: masked text plus everything needed to
/// restore it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaskedDocument {
    /// Text with headings wrapped and all other template syntax masked
    pub text: String,
    pub placeholders: PlaceholderMap,
    pub headings: HeadingCalls,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_keys_are_sequential() {
        let mut map = PlaceholderMap::new();
        assert_eq!(map.insert("{{ a }}".to_string()), "J000000");
        assert_eq!(map.insert("{% b %}".to_string()), "J000001");
        assert_eq!(map.get("J000001"), Some("{% b %}"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_placeholder_unknown_keys() {
        let mut map = PlaceholderMap::new();
        map.insert("x".to_string());
        assert_eq!(map.get("J000001"), None);
        assert_eq!(map.get("H000000"), None);
        assert_eq!(map.get("J12"), None);
        assert_eq!(map.get("Jabcdef"), None);
    }

    #[test]
    fn test_placeholder_iteration_order() {
        let mut map = PlaceholderMap::new();
        map.insert("first".to_string());
        map.insert("second".to_string());
        let pairs: Vec<_> = map.iter().collect();
        assert_eq!(
            pairs,
            vec![("J000000".to_string(), "first"), ("J000001".to_string(), "second")]
        );
    }

    #[test]
    fn test_heading_wrapper_tag_escapes_content() {
        let call = HeadingCall {
            level: HeadingLevel::Two,
            prefix: "{{ heading2(".to_string(),
            suffix: ") }}".to_string(),
            token: "\"R&D\"".to_string(),
            content: "R&D".to_string(),
        };
        assert_eq!(call.wrapper_tag("H000000"), r#"<x-h2 data-k="H000000">R&amp;D</x-h2>"#);
        assert_eq!(call.quote(), '"');
    }

    #[test]
    fn test_heading_level_names() {
        let level = HeadingLevel::from_digit("3").unwrap();
        assert_eq!(level.macro_name(), "heading3");
        assert_eq!(level.tag_name(), "x-h3");
        assert_eq!(HeadingLevel::from_digit("4"), None);
    }
}
