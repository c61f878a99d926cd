//! String literals inside non-literal heading calls
//!
//! A heading whose argument is an expression, e.g.
//! `{{ heading3(unit_type|first_upper ~ " unit") }}`, cannot be wrapped as a
//! whole. Only its quoted literals are translatable; everything around them
//! (variables, filters, operators) must survive byte-for-byte. All such
//! literals in a document are translated in one batched request and spliced
//! back with their original quote character.

use crate::mt::error::{MtError, MtResult};
use crate::mt::translator::{MachineTranslator, TranslateOptions};
use crate::template::data::LiteralSpan;
use crate::template::escape::{STRING_LITERAL, literal_content, requote};
use crate::template::heading::LITERAL_HEADING_CALL;
use crate::template::masking::{in_regions, opaque_regions};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, info};

static HEADING_CALL_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{[-+]?\s*heading[23]\(").expect("heading call pattern")
});

/// Byte offset of the `)` that closes an argument list starting at `from`
///
/// Nested parentheses are balanced and quoted strings skipped. Returns `None`
/// when the enclosing `{{ ... }}` ends first or the input runs out.
fn argument_end(src: &str, from: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = from;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(_) if b == b'\\' => i += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'(' => depth += 1,
                b')' if depth == 0 => return Some(i),
                b')' => depth -= 1,
                b'}' if bytes.get(i + 1) == Some(&b'}') => return None,
                _ => {}
            },
        }
        i += 1;
    }
    None
}

/// Find every non-empty string literal inside non-literal heading arguments
///
/// Only the call's own argument list is searched. Calls the wrapper stage
/// handles are skipped, as are calls inside raw blocks and comments. Spans
/// are returned in document order.
pub fn find_embedded_literals(src: &str) -> Vec<LiteralSpan> {
    let regions = opaque_regions(src);
    let literal_calls: HashSet<usize> = LITERAL_HEADING_CALL
        .find_iter(src)
        .map(|m| m.start())
        .collect();

    let mut spans = Vec::new();
    for call in HEADING_CALL_START.find_iter(src) {
        let Some(close) = argument_end(src, call.end()) else {
            continue;
        };
        if literal_calls.contains(&call.start()) || in_regions(&(call.start()..close + 1), &regions)
        {
            continue;
        }

        let arg = &src[call.end()..close];
        for lit in STRING_LITERAL.find_iter(arg) {
            let content = literal_content(lit.as_str());
            if content.is_empty() {
                continue;
            }
            spans.push(LiteralSpan {
                start: call.end() + lit.start(),
                end: call.end() + lit.end(),
                token: lit.as_str().to_string(),
                content,
            });
        }
    }

    spans
}

/// Replace each span's literal with its translation
///
/// `translations` must be in span order. Unchanged content keeps the original
/// token; changed content is re-quoted with the span's quote character.
pub fn splice_literals(
    src: &str,
    spans: &[LiteralSpan],
    translations: &[String],
) -> MtResult<String> {
    if spans.len() != translations.len() {
        return Err(MtError::TranslationError(format!(
            "Expected {} literal translations, got {}",
            spans.len(),
            translations.len()
        )));
    }

    let mut out = String::with_capacity(src.len());
    let mut last = 0;
    for (span, translated) in spans.iter().zip(translations) {
        out.push_str(&src[last..span.start]);
        out.push_str(&requote(translated, &span.token, &span.content));
        last = span.end;
    }
    out.push_str(&src[last..]);
    Ok(out)
}

/// Translate string literals embedded in non-literal heading arguments
///
/// Issues exactly one batched request for the whole document, or none at all
/// when there is nothing to translate.
pub async fn translate_embedded_literals<T: MachineTranslator + ?Sized>(
    src: &str,
    translator: &T,
    opts: &TranslateOptions,
) -> MtResult<String> {
    let spans = find_embedded_literals(src);
    if spans.is_empty() {
        debug!("No embedded heading literals; skipping batch request");
        return Ok(src.to_string());
    }

    let texts: Vec<String> = spans.iter().map(|s| s.content.clone()).collect();
    info!(
        literals = texts.len(),
        provider = translator.provider_name(),
        "Translating embedded heading literals"
    );
    let translations = translator.translate_batch(&texts, &opts.plain()).await?;

    splice_literals(src, &spans, &translations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mt::mock::{MockMode, MockTranslator};
    use std::collections::HashMap;

    fn opts() -> TranslateOptions {
        TranslateOptions::new("EN", "DE")
    }

    #[test]
    fn test_find_literal_in_expression() {
        let src = r#"<h3>{{ heading3(unit_type|first_upper ~ " unit") }}</h3>"#;
        let spans = find_embedded_literals(src);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].content, " unit");
        assert_eq!(spans[0].quote(), '"');
        assert_eq!(&src[spans[0].start..spans[0].end], r#"" unit""#);
    }

    #[test]
    fn test_pure_literals_are_skipped() {
        let src = r#"{{ heading2("Hello") }}{{ heading3( 'World' ) }}"#;
        assert!(find_embedded_literals(src).is_empty());
    }

    #[test]
    fn test_literals_at_both_ends_are_not_a_pure_literal() {
        let src = r#"{{ heading2("Total " ~ count ~ " items") }}"#;
        let spans = find_embedded_literals(src);
        let contents: Vec<&str> = spans.iter().map(|s| s.content.as_str()).collect();
        assert_eq!(contents, vec!["Total ", " items"]);
    }

    #[test]
    fn test_empty_literals_skipped() {
        let src = r#"{{ heading2(title ~ '' ~ "!") }}"#;
        let spans = find_embedded_literals(src);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].content, "!");
    }

    #[test]
    fn test_scan_stops_at_end_of_own_expression() {
        let src = r#"{{ heading2("Features") if show }}<p class="intro">Hi</p>{{ heading3("Specs") }}"#;
        let contents: Vec<String> = find_embedded_literals(src)
            .into_iter()
            .map(|s| s.content)
            .collect();
        assert_eq!(contents, vec!["Features"]);
    }

    #[test]
    fn test_filtered_call_keeps_following_markup() {
        let src = r#"{{ heading3(kind ~ " unit") | upper }}<a href="/x" title='t'>{{ "y" }}</a>"#;
        let spans = find_embedded_literals(src);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].content, " unit");
    }

    #[test]
    fn test_nested_parens_and_quoted_parens() {
        let src = r#"{{ heading2(fmt("a)b", x) ~ " (c)") }}"#;
        let contents: Vec<String> = find_embedded_literals(src)
            .into_iter()
            .map(|s| s.content)
            .collect();
        assert_eq!(contents, vec!["a)b", " (c)"]);
    }

    #[test]
    fn test_unclosed_call_is_ignored() {
        let src = r#"{{ heading2("a" }}<p title="b">c</p> ) }}"#;
        assert!(find_embedded_literals(src).is_empty());
    }

    #[tokio::test]
    async fn test_markup_after_conditional_call_untouched() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let src = r#"{{ heading2("Features") if show }}<p class="intro">Hi</p>{{ heading3("Specs") }}"#;
        let out = translate_embedded_literals(src, &mock, &opts()).await.unwrap();

        assert_eq!(mock.requests(), vec![vec!["Features".to_string()]]);
        assert_eq!(
            out,
            r#"{{ heading2("Features_de") if show }}<p class="intro">Hi</p>{{ heading3("Specs") }}"#
        );
    }

    #[test]
    fn test_literal_in_raw_block_skipped() {
        let src = r#"{% raw %}{{ heading3(x ~ " unit") }}{% endraw %}"#;
        assert!(find_embedded_literals(src).is_empty());
    }

    #[test]
    fn test_splice_keeps_quote_style() {
        let src = r#"{{ heading3(a ~ ' unit' ~ b ~ " item") }}"#;
        let spans = find_embedded_literals(src);
        let out = splice_literals(
            src,
            &spans,
            &[" Einheit's".to_string(), " Artikel".to_string()],
        )
        .unwrap();
        assert_eq!(out, r#"{{ heading3(a ~ ' Einheit\'s' ~ b ~ " Artikel") }}"#);
    }

    #[test]
    fn test_splice_count_mismatch() {
        let src = r#"{{ heading3(a ~ " unit") }}"#;
        let spans = find_embedded_literals(src);
        assert!(splice_literals(src, &spans, &[]).is_err());
    }

    #[tokio::test]
    async fn test_translate_sends_only_literals() {
        let mut map = HashMap::new();
        map.insert((" unit".to_string(), "de".to_string()), " Einheit".to_string());
        let mock = MockTranslator::new(MockMode::Mappings(map));

        let src = r#"<h3>{{ heading3(unit_type|first_upper ~ " unit") }}</h3>"#;
        let out = translate_embedded_literals(src, &mock, &opts()).await.unwrap();

        assert_eq!(out, r#"<h3>{{ heading3(unit_type|first_upper ~ " Einheit") }}</h3>"#);
        assert_eq!(mock.requests(), vec![vec![" unit".to_string()]]);
    }

    #[tokio::test]
    async fn test_single_batch_for_whole_document() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let src = r#"{{ heading2(a ~ " one") }} <p>x</p> {{ heading3(b ~ 'two') }}"#;
        let out = translate_embedded_literals(src, &mock, &opts()).await.unwrap();

        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock.requests()[0], vec![" one".to_string(), "two".to_string()]);
        assert_eq!(out, r#"{{ heading2(a ~ " one_de") }} <p>x</p> {{ heading3(b ~ 'two_de') }}"#);
    }

    #[tokio::test]
    async fn test_no_literals_no_request() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let src = r#"{{ heading2("Only pure") }} {{ heading3(title) }}"#;
        let out = translate_embedded_literals(src, &mock, &opts()).await.unwrap();
        assert_eq!(out, src);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_vendor_failure_propagates() {
        let mock = MockTranslator::new(MockMode::Error("quota exceeded".to_string()));
        let src = r#"{{ heading3(x ~ " unit") }}"#;
        assert!(translate_embedded_literals(src, &mock, &opts()).await.is_err());
    }
}
