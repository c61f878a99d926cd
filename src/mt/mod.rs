//! Machine Translation Module
//!
//! Vendor plumbing for the translation pipelines: the provider trait, the
//! DeepL client, glossary lookup/synchronisation, paragraph chunking and a
//! deterministic mock for tests and offline runs.
//!
//! # Example
//!
//! ```ignore
//! use jinja_mt::mt::{DeepLProvider, GlossarySelection, TranslateOptions, resolve_glossary};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = DeepLProvider::from_env()?;
//!     let glossary = resolve_glossary(&provider, &GlossarySelection::Auto, "EN", "DE").await;
//!     let opts = TranslateOptions::new("EN", "DE").with_glossary(glossary);
//!     let translated = provider.translate("Hello", &opts).await?;
//!     println!("{}", translated);
//!     Ok(())
//! }
//! ```

pub mod chunk;
pub mod deepl;
pub mod error;
pub mod glossary;
pub mod mock;
pub mod translator;

pub use chunk::{DEFAULT_HTML_CHUNK, DEFAULT_TEXT_CHUNK, split_paragraphs};
pub use deepl::DeepLProvider;
pub use error::{MtError, MtResult};
pub use glossary::{
    DEFAULT_GLOSSARY_PREFIX, GlossaryInfo, GlossarySelection, GlossaryStore, ensure_glossary,
    find_glossary_id, glossary_name, resolve_glossary,
};
pub use mock::{MockMode, MockTranslator};
pub use translator::{
    HTML_IGNORE_TAGS, MachineTranslator, TagHandling, TranslateOptions, normalize_source_lang,
    resolve_target_lang, validate_locale,
};
