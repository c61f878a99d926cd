//! Document translation pipelines
//!
//! Three document kinds are translated:
//!
//! - Jinja templates: literal heading text is exposed, all other template
//!   syntax is masked, the body goes to the vendor as HTML and everything is
//!   restored afterwards.
//! - Rendered HTML: plain HTML translation.
//! - Plain text (PDF extraction): paragraph-chunked text translation.
//!
//! Long bodies are split at paragraph boundaries and translated chunk by
//! chunk. A failing vendor call aborts the whole document.

use crate::mt::chunk::{DEFAULT_HTML_CHUNK, DEFAULT_TEXT_CHUNK, split_paragraphs};
use crate::mt::error::MtResult;
use crate::mt::translator::{MachineTranslator, TagHandling, TranslateOptions};
use crate::template::{self, PLACEHOLDER_TAG, check_reserved_markup};
use tracing::{debug, info};

/// Tags that stay untranslated when a masked template goes to the vendor
pub fn template_tag_handling() -> TagHandling {
    TagHandling::html_ignoring(&[PLACEHOLDER_TAG])
}

/// Translate `text` chunk by chunk and join the results in order
///
/// Whitespace-only chunks are passed through without a vendor call.
async fn translate_chunked<T: MachineTranslator + ?Sized>(
    translator: &T,
    text: &str,
    opts: &TranslateOptions,
    max_len: usize,
) -> MtResult<String> {
    let chunks = split_paragraphs(text, max_len);
    debug!(chunks = chunks.len(), bytes = text.len(), "Split document");

    let mut out = String::with_capacity(text.len());
    for (i, chunk) in chunks.iter().enumerate() {
        if chunk.trim().is_empty() {
            out.push_str(chunk);
            continue;
        }
        debug!(chunk = i, bytes = chunk.len(), "Translating chunk");
        out.push_str(&translator.translate(chunk, opts).await?);
    }
    Ok(out)
}

/// Translate a Jinja/HTML template, keeping all template syntax intact
///
/// 1. Quoted literals inside non-literal heading arguments are translated in
///    one batch.
/// 2. Literal heading calls are wrapped and the rest of the syntax masked.
/// 3. The masked body is translated as HTML with placeholders ignored.
/// 4. Placeholders are verified and restored, then heading calls rebuilt.
///
/// `opts` carries languages and glossary; its tag handling is replaced.
pub async fn translate_template<T: MachineTranslator + ?Sized>(
    translator: &T,
    source: &str,
    opts: &TranslateOptions,
) -> MtResult<String> {
    check_reserved_markup(source)?;

    info!(
        provider = translator.provider_name(),
        "{} -> {}: translating template ({} bytes)",
        opts.source_lang,
        opts.target_lang,
        source.len()
    );

    let with_literals = template::translate_embedded_literals(source, translator, opts).await?;

    let doc = template::prepare(&with_literals)?;
    info!(
        placeholders = doc.placeholders.len(),
        headings = doc.headings.len(),
        "Masked template syntax"
    );

    let html_opts = opts.clone().with_tag_handling(template_tag_handling());
    let translated = translate_chunked(translator, &doc.text, &html_opts, DEFAULT_HTML_CHUNK).await?;

    let restored = template::restore(&translated, &doc)?;
    info!("Restored template syntax");
    Ok(restored)
}

/// Translate rendered HTML
///
/// `script`, `style`, `code` and `pre` content is left untranslated.
pub async fn translate_html<T: MachineTranslator + ?Sized>(
    translator: &T,
    html: &str,
    opts: &TranslateOptions,
) -> MtResult<String> {
    info!(
        provider = translator.provider_name(),
        "{} -> {}: translating HTML ({} bytes)",
        opts.source_lang,
        opts.target_lang,
        html.len()
    );
    let html_opts = opts.clone().with_tag_handling(TagHandling::html_ignoring(&[]));
    translate_chunked(translator, html, &html_opts, DEFAULT_HTML_CHUNK).await
}

/// Translate plain text without tag handling
///
/// Empty input gives empty output without contacting the vendor.
pub async fn translate_plain_text<T: MachineTranslator + ?Sized>(
    translator: &T,
    text: &str,
    opts: &TranslateOptions,
) -> MtResult<String> {
    if text.trim().is_empty() {
        debug!("Empty text; skipping translation");
        return Ok(String::new());
    }
    info!(
        provider = translator.provider_name(),
        "{} -> {}: translating text ({} chars)",
        opts.source_lang,
        opts.target_lang,
        text.chars().count()
    );
    translate_chunked(translator, text, &opts.plain(), DEFAULT_TEXT_CHUNK).await
}
