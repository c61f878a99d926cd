//! Literal heading calls
//!
//! `{{ heading2("Our product") }}` hides its translatable text inside Jinja
//! syntax, which the masker would swallow whole. Before masking, every
//! heading call whose argument is a single string literal is swapped for an
//! inert wrapper element holding the literal's content:
//!
//! ```text
//! {{ heading2("Our product") }}
//! <x-h2 data-k="H000000">Our product</x-h2>
//! ```
//!
//! The vendor translates the element text like any other HTML. Afterwards each
//! wrapper is turned back into the original call around the re-quoted content.

use crate::template::data::{HeadingCall, HeadingCalls, HeadingLevel};
use crate::template::escape::{
    STRING_LITERAL_PATTERN, literal_content, quote_literal, requote, unescape_html_text,
};
use crate::template::masking::{in_regions, opaque_regions};
use regex::{Captures, Regex};
use std::sync::LazyLock;

pub(crate) static LITERAL_HEADING_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?s)\{{\{{[-+]?\s*heading(?P<lvl>[23])\(\s*(?P<string>{})\s*\)\s*[-+]?\}}\}}",
        STRING_LITERAL_PATTERN
    ))
    .expect("literal heading call pattern")
});

static WRAPPER_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<x-h(?P<lvl>[23])(?P<attrs>[^>]*)>(?P<content>.*?)</x-h[23]\s*>")
        .expect("heading wrapper pattern")
});

static WRAPPER_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"data-k\s*=\s*"(H\d{6,})""#).expect("heading wrapper key pattern")
});

/// Replace literal heading calls with wrapper tags, recording each call
///
/// Calls inside raw blocks or comments are left as they are.
pub fn wrap_literal_headings(src: &str, calls: &mut HeadingCalls) -> String {
    let regions = opaque_regions(src);
    let mut out = String::with_capacity(src.len());
    let mut last = 0;

    for caps in LITERAL_HEADING_CALL.captures_iter(src) {
        let (Some(whole), Some(string)) = (caps.get(0), caps.name("string")) else {
            continue;
        };
        let Some(level) = caps.name("lvl").and_then(|l| HeadingLevel::from_digit(l.as_str()))
        else {
            continue;
        };
        if in_regions(&whole.range(), &regions) {
            continue;
        }

        let call = HeadingCall {
            level,
            prefix: src[whole.start()..string.start()].to_string(),
            suffix: src[string.end()..whole.end()].to_string(),
            token: string.as_str().to_string(),
            content: literal_content(string.as_str()),
        };

        out.push_str(&src[last..whole.start()]);
        let key = calls.insert(call.clone());
        out.push_str(&call.wrapper_tag(&key));
        last = whole.end();
    }

    out.push_str(&src[last..]);
    out
}

/// Turn wrapper tags back into heading calls
///
/// A wrapper whose key is known is rebuilt with the call's original spacing
/// and quote character. A wrapper without a usable key is rebuilt in the
/// canonical `{{ headingN("...") }}` form.
pub fn restore_heading_calls(html: &str, calls: &HeadingCalls) -> String {
    WRAPPER_TAG
        .replace_all(html, |caps: &Captures| {
            let content = unescape_html_text(&caps["content"]);
            let known = WRAPPER_KEY
                .captures(&caps["attrs"])
                .and_then(|k| calls.get(&k[1]));

            match known {
                Some(call) => format!(
                    "{}{}{}",
                    call.prefix,
                    requote(&content, &call.token, &call.content),
                    call.suffix
                ),
                None => format!(
                    "{{{{ heading{}({}) }}}}",
                    &caps["lvl"],
                    quote_literal(&content, '"')
                ),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_roundtrip(src: &str) -> (String, HeadingCalls) {
        let mut calls = HeadingCalls::new();
        let wrapped = wrap_literal_headings(src, &mut calls);
        assert_eq!(restore_heading_calls(&wrapped, &calls), src);
        (wrapped, calls)
    }

    #[test]
    fn test_wrap_double_quoted_literal() {
        let (wrapped, calls) = identity_roundtrip(r#"<div>{{ heading2("Hello") }}</div>"#);
        assert_eq!(wrapped, r#"<div><x-h2 data-k="H000000">Hello</x-h2></div>"#);
        assert_eq!(calls.len(), 1);
    }

    #[test]
    fn test_wrap_single_quoted_with_escape() {
        let (wrapped, _) = identity_roundtrip(r"{{heading3('It\'s ours')}}");
        assert_eq!(wrapped, r#"<x-h3 data-k="H000000">It's ours</x-h3>"#);
    }

    #[test]
    fn test_wrap_multiple_in_order() {
        let src = r#"{{ heading2("One") }} text {{ heading3('Two') }}"#;
        let (wrapped, calls) = identity_roundtrip(src);
        assert!(wrapped.contains(r#"<x-h2 data-k="H000000">One</x-h2>"#));
        assert!(wrapped.contains(r#"<x-h3 data-k="H000001">Two</x-h3>"#));
        assert_eq!(calls.get("H000001").unwrap().content, "Two");
    }

    #[test]
    fn test_non_literal_argument_untouched() {
        let src = r#"{{ heading3(unit_type|first_upper ~ " unit") }}"#;
        let (wrapped, calls) = identity_roundtrip(src);
        assert_eq!(wrapped, src);
        assert!(calls.is_empty());
    }

    #[test]
    fn test_other_levels_untouched() {
        let src = r#"{{ heading1("Top") }}{{ heading4("Low") }}"#;
        let (wrapped, _) = identity_roundtrip(src);
        assert_eq!(wrapped, src);
    }

    #[test]
    fn test_calls_in_raw_and_comments_untouched() {
        let src = r#"{% raw %}{{ heading2("Raw") }}{% endraw %}{# {{ heading2("Old") }} #}"#;
        let (wrapped, calls) = identity_roundtrip(src);
        assert_eq!(wrapped, src);
        assert!(calls.is_empty());
    }

    #[test]
    fn test_html_special_characters_roundtrip() {
        let (wrapped, _) = identity_roundtrip(r#"{{ heading2("R&D <lab>") }}"#);
        assert!(wrapped.contains("R&amp;D &lt;lab&gt;"));
    }

    #[test]
    fn test_restore_translated_content_keeps_quote_style() {
        let mut calls = HeadingCalls::new();
        let wrapped = wrap_literal_headings(r"{{ heading2('Our team') }}", &mut calls);
        let translated = wrapped.replace("Our team", "Unser Team's");
        assert_eq!(
            restore_heading_calls(&translated, &calls),
            r"{{ heading2('Unser Team\'s') }}"
        );
    }

    #[test]
    fn test_restore_without_key_uses_canonical_form() {
        let calls = HeadingCalls::new();
        let restored = restore_heading_calls(r#"<x-h3>Sagen "Hallo"</x-h3>"#, &calls);
        assert_eq!(restored, r#"{{ heading3("Sagen \"Hallo\"") }}"#);
    }

    #[test]
    fn test_restore_decodes_vendor_entities() {
        let calls = HeadingCalls::new();
        let restored = restore_heading_calls("<x-h2>F&amp;E</x-h2>", &calls);
        assert_eq!(restored, r#"{{ heading2("F&E") }}"#);
    }
}
