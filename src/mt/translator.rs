//! Machine Translation trait and utilities
//!
//! This module defines the `MachineTranslator` trait for provider abstraction,
//! enabling support for different MT backends (DeepL, mock, etc.)
//! without coupling the pipeline to any specific implementation.
//!
//! # Example
//!
//! ```ignore
//! use jinja_mt::mt::{DeepLProvider, MachineTranslator, TranslateOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = DeepLProvider::from_env()?;
//!     let opts = TranslateOptions::new("EN", "DE");
//!
//!     let result = provider.translate("Hello, world!", &opts).await?;
//!     println!("{}", result); // "Hallo, Welt!"
//!
//!     let texts = vec!["Hello".to_string(), "Goodbye".to_string()];
//!     let results = provider.translate_batch(&texts, &opts).await?;
//!     println!("{:?}", results);
//!
//!     Ok(())
//! }
//! ```

use crate::mt::error::{MtError, MtResult};
use async_trait::async_trait;

/// Tags whose content must never be translated in rendered HTML
pub const HTML_IGNORE_TAGS: [&str; 4] = ["script", "style", "code", "pre"];

/// How the vendor should treat markup in the submitted text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagHandling {
    /// Parse the text as HTML, keep all tags verbatim and skip the content
    /// of the listed elements
    Html { ignore_tags: Vec<String> },
}

impl TagHandling {
    /// HTML handling that skips `script`, `style`, `code`, `pre` plus `extra`
    pub fn html_ignoring(extra: &[&str]) -> Self {
        let ignore_tags = extra
            .iter()
            .chain(HTML_IGNORE_TAGS.iter())
            .map(|t| t.to_string())
            .collect();
        TagHandling::Html { ignore_tags }
    }
}

/// Per-request translation settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateOptions {
    /// Source language code (e.g. "EN")
    pub source_lang: String,
    /// Target language code as the vendor expects it (e.g. "DE", "EN-GB")
    pub target_lang: String,
    /// Resolved glossary identifier, if any
    pub glossary_id: Option<String>,
    /// Markup handling; `None` means plain text
    pub tag_handling: Option<TagHandling>,
}

impl TranslateOptions {
    pub fn new(source_lang: &str, target_lang: &str) -> Self {
        Self {
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            glossary_id: None,
            tag_handling: None,
        }
    }

    pub fn with_glossary(mut self, glossary_id: Option<String>) -> Self {
        self.glossary_id = glossary_id;
        self
    }

    pub fn with_tag_handling(mut self, tag_handling: TagHandling) -> Self {
        self.tag_handling = Some(tag_handling);
        self
    }

    /// Same languages and glossary, no tag handling
    pub fn plain(&self) -> Self {
        Self {
            tag_handling: None,
            ..self.clone()
        }
    }
}

/// Generic trait for machine translation providers
///
/// Implementations of this trait handle the actual translation work,
/// whether through an API (DeepL) or deterministic logic (Mock).
///
/// All methods are async to support I/O-bound operations like network requests.
#[async_trait]
pub trait MachineTranslator: Send + Sync {
    /// Translate a single text string
    ///
    /// # Arguments
    ///
    /// * `text` - The text to translate
    /// * `opts` - Languages, glossary and tag handling
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The translated text
    /// * `Err(MtError)` - If translation fails
    async fn translate(&self, text: &str, opts: &TranslateOptions) -> MtResult<String>;

    /// Translate multiple strings in a single batch operation
    ///
    /// Batch translation is more efficient than individual translations,
    /// especially for providers with per-request overhead (like API calls).
    /// Implementations may chunk large batches internally.
    ///
    /// # Guarantees
    ///
    /// - Output order matches input order
    /// - Output length equals input length
    async fn translate_batch(
        &self,
        texts: &[String],
        opts: &TranslateOptions,
    ) -> MtResult<Vec<String>>;

    /// Get the name of this translation provider
    ///
    /// Used for logging to identify which provider handled a translation.
    fn provider_name(&self) -> &str;
}

/// Reduce a language code to its upper-case base language
///
/// - `en-GB` → `EN`
/// - `pt_br` → `PT`
/// - `de` → `DE`
///
/// Source languages never carry a regional variant.
pub fn normalize_source_lang(lang: &str) -> String {
    lang.split(['-', '_'])
        .next()
        .unwrap_or(lang)
        .to_uppercase()
}

/// Resolve a target language code for the vendor
///
/// A bare English target is mapped to the configured regional variant
/// (`EN-GB` or `EN-US`); everything else is upper-cased as given.
pub fn resolve_target_lang(lang: &str, en_variant: &str) -> String {
    let upper = lang.to_uppercase().replace('_', "-");
    if upper == "EN" {
        en_variant.to_uppercase()
    } else {
        upper
    }
}

/// Validate that a language code is in acceptable format
///
/// Checks that the code contains only alphanumeric characters,
/// hyphens, and underscores.
pub fn validate_locale(locale: &str) -> MtResult<()> {
    if locale.is_empty() {
        return Err(MtError::InvalidLocale(
            "Language code is empty".to_string(),
        ));
    }

    if !locale
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(MtError::InvalidLocale(format!(
            "Invalid characters in language code: {}",
            locale
        )));
    }

    Ok(())
}
