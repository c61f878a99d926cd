//! Jinja string literal escaping
//!
//! Literal tokens are unescaped with the host language's rules (Python-style
//! escapes, unknown escapes kept verbatim). Re-insertion uses one discipline
//! for both quote styles: wrap in the original quote character and escape only
//! the backslash and that quote character. `unescape_literal(&quote_literal(s, q))`
//! always gives back `s`.

use regex::Regex;
use std::iter::Peekable;
use std::str::Chars;
use std::sync::LazyLock;

/// One single- or double-quoted string literal, escapes included
pub const STRING_LITERAL_PATTERN: &str =
    r#"'[^'\\]*(?:\\.[^'\\]*)*'|"[^"\\]*(?:\\.[^"\\]*)*""#;

pub(crate) static STRING_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("(?s){}", STRING_LITERAL_PATTERN)).expect("string literal pattern")
});

/// Unescape a quoted literal token such as `'it\'s'`
///
/// Returns `None` when the token is not a well-formed literal (wrong quotes,
/// dangling backslash, malformed `\x`/`\u`/`\U` escape).
pub fn unescape_literal(token: &str) -> Option<String> {
    let quote = token.chars().next()?;
    if !matches!(quote, '"' | '\'') || token.len() < 2 || !token.ends_with(quote) {
        return None;
    }

    let inner = &token[1..token.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0C}'),
            'v' => out.push('\u{0B}'),
            d @ '0'..='7' => out.push(read_octal(d, &mut chars)?),
            'x' => out.push(read_hex(&mut chars, 2)?),
            'u' => out.push(read_hex(&mut chars, 4)?),
            'U' => out.push(read_hex(&mut chars, 8)?),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    Some(out)
}

fn read_octal(first: char, chars: &mut Peekable<Chars<'_>>) -> Option<char> {
    let mut value = first.to_digit(8)?;
    for _ in 0..2 {
        match chars.peek().and_then(|c| c.to_digit(8)) {
            Some(d) => {
                value = value * 8 + d;
                chars.next();
            }
            None => break,
        }
    }
    char::from_u32(value)
}

fn read_hex(chars: &mut Peekable<Chars<'_>>, digits: usize) -> Option<char> {
    let mut value = 0u32;
    for _ in 0..digits {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    char::from_u32(value)
}

/// Content of a literal token, best effort
///
/// Falls back to the raw token with its outer quote characters stripped when
/// the token cannot be unescaped.
pub fn literal_content(token: &str) -> String {
    unescape_literal(token).unwrap_or_else(|| token.trim_matches(['"', '\'']).to_string())
}

/// Quote `content` with `quote`, escaping only backslash and `quote`
pub fn quote_literal(content: &str, quote: char) -> String {
    let mut out = String::with_capacity(content.len() + 2);
    out.push(quote);
    for c in content.chars() {
        if c == '\\' || c == quote {
            out.push('\\');
        }
        out.push(c);
    }
    out.push(quote);
    out
}

/// Re-emit a literal for `content`, reusing `original_token` when the content
/// did not change so untouched literals stay byte-identical
pub fn requote(content: &str, original_token: &str, original_content: &str) -> String {
    if content == original_content {
        original_token.to_string()
    } else {
        let quote = original_token.chars().next().unwrap_or('"');
        quote_literal(content, quote)
    }
}

/// Escape text for placement inside an HTML element
pub fn escape_html_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Undo the entity escaping an HTML-aware vendor applies to element text
pub fn unescape_html_text(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", "\u{A0}")
        .replace("&amp;", "&")
}
