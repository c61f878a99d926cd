//! Glossary lookup and synchronisation
//!
//! A glossary is a named, vendor-side list of forced term translations for
//! one language direction. Translation runs only need its identifier, which is
//! looked up by name and language pair. Lookup problems never abort a
//! translation: the document is translated without a glossary instead.

use crate::mt::error::{MtError, MtResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Prefix used for automatically named glossaries (`epd-EN-DE`)
pub const DEFAULT_GLOSSARY_PREFIX: &str = "epd";

/// Glossary metadata as reported by the vendor
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GlossaryInfo {
    pub glossary_id: String,
    pub name: String,
    pub source_lang: String,
    pub target_lang: String,
    #[serde(default)]
    pub entry_count: usize,
    #[serde(default)]
    pub ready: bool,
}

impl GlossaryInfo {
    /// Exact name and case-insensitive language pair match
    pub fn matches(&self, name: &str, source_lang: &str, target_lang: &str) -> bool {
        self.name == name
            && self.source_lang.eq_ignore_ascii_case(source_lang)
            && self.target_lang.eq_ignore_ascii_case(target_lang)
    }
}

/// Vendor-side glossary storage
#[async_trait]
pub trait GlossaryStore: Send + Sync {
    async fn list_glossaries(&self) -> MtResult<Vec<GlossaryInfo>>;

    async fn create_glossary(
        &self,
        name: &str,
        source_lang: &str,
        target_lang: &str,
        entries: &BTreeMap<String, String>,
    ) -> MtResult<GlossaryInfo>;

    async fn delete_glossary(&self, glossary_id: &str) -> MtResult<()>;
}

/// Which glossary a translation run should use
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlossarySelection {
    /// Translate without a glossary
    None,
    /// Use `{prefix}-{SRC}-{TGT}`
    Auto,
    /// Use the glossary with this exact name
    Named(String),
}

impl GlossarySelection {
    /// Parse the CLI form: `none`, `auto`, or a glossary name
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "none" | "" => GlossarySelection::None,
            "auto" => GlossarySelection::Auto,
            _ => GlossarySelection::Named(value.trim().to_string()),
        }
    }

    /// Concrete glossary name for a language pair, if any
    pub fn glossary_name(&self, source_lang: &str, target_lang: &str) -> Option<String> {
        match self {
            GlossarySelection::None => None,
            GlossarySelection::Auto => Some(glossary_name(
                DEFAULT_GLOSSARY_PREFIX,
                source_lang,
                target_lang,
            )),
            GlossarySelection::Named(name) => Some(name.clone()),
        }
    }
}

/// Stable glossary name for a direction, e.g. `epd-EN-DE`
pub fn glossary_name(prefix: &str, source_lang: &str, target_lang: &str) -> String {
    format!(
        "{}-{}-{}",
        prefix,
        source_lang.to_uppercase(),
        target_lang.to_uppercase()
    )
}

/// Find the identifier of the glossary named `name` for `source_lang → target_lang`
pub async fn find_glossary_id<S: GlossaryStore + ?Sized>(
    store: &S,
    name: &str,
    source_lang: &str,
    target_lang: &str,
) -> MtResult<Option<String>> {
    let glossaries = store.list_glossaries().await?;
    Ok(glossaries
        .into_iter()
        .find(|g| g.matches(name, source_lang, target_lang))
        .map(|g| g.glossary_id))
}

/// Resolve the glossary for a translation run
///
/// Never fails: a missing glossary or a failed lookup is logged and the run
/// continues without one. Glossary language pairs never carry a regional
/// variant, so callers pass base language codes here.
pub async fn resolve_glossary<S: GlossaryStore + ?Sized>(
    store: &S,
    selection: &GlossarySelection,
    source_lang: &str,
    target_lang: &str,
) -> Option<String> {
    let name = selection.glossary_name(source_lang, target_lang)?;

    match find_glossary_id(store, &name, source_lang, target_lang).await {
        Ok(Some(id)) => {
            info!(glossary = %name, id = %id, "Using glossary");
            Some(id)
        }
        Ok(None) => {
            warn!(
                glossary = %name,
                "Glossary not found for {}->{}; continuing without it",
                source_lang, target_lang
            );
            None
        }
        Err(e) => {
            warn!(glossary = %name, error = %e, "Could not look up glossary; continuing without it");
            None
        }
    }
}

/// Make the vendor glossary `name` hold exactly `pairs`
///
/// The v2 API cannot replace entries in place, so an existing glossary with
/// the same name and direction is deleted and recreated.
pub async fn ensure_glossary<S: GlossaryStore + ?Sized>(
    store: &S,
    name: &str,
    source_lang: &str,
    target_lang: &str,
    pairs: &BTreeMap<String, String>,
) -> MtResult<GlossaryInfo> {
    if pairs.is_empty() {
        return Err(MtError::GlossaryError(format!(
            "Refusing to create empty glossary '{}'",
            name
        )));
    }

    for existing in store.list_glossaries().await? {
        if existing.matches(name, source_lang, target_lang) {
            info!(glossary = %name, id = %existing.glossary_id, "Replacing existing glossary");
            store.delete_glossary(&existing.glossary_id).await?;
        }
    }

    store
        .create_glossary(name, source_lang, target_lang, pairs)
        .await
}
