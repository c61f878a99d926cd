//! Run configuration
//!
//! Settings come from two places: command line flags (languages, glossary,
//! `--mock`) and the environment (`DEEPL_API_KEY`, `DEEPL_API_URL`). A
//! missing key is detected here, before any file or network I/O happens.

use crate::mt::deepl::DeepLProvider;
use crate::mt::error::{MtError, MtResult};
use crate::mt::glossary::{GlossarySelection, GlossaryStore, resolve_glossary};
use crate::mt::mock::{MockMode, MockTranslator};
use crate::mt::translator::{
    MachineTranslator, TranslateOptions, normalize_source_lang, resolve_target_lang,
    validate_locale,
};

/// Environment variable holding the DeepL key
pub const API_KEY_VAR: &str = "DEEPL_API_KEY";

/// Environment variable overriding the DeepL base URL
pub const API_URL_VAR: &str = "DEEPL_API_URL";

/// English variants the vendor accepts for an `EN` target
pub const EN_VARIANTS: [&str; 2] = ["EN-GB", "EN-US"];

/// Language direction and glossary choice for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Languages {
    pub source: String,
    pub target: String,
    pub en_variant: String,
    pub glossary: GlossarySelection,
}

impl Languages {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            en_variant: EN_VARIANTS[0].to_string(),
            glossary: GlossarySelection::None,
        }
    }

    pub fn with_en_variant(mut self, en_variant: &str) -> Self {
        self.en_variant = en_variant.to_uppercase();
        self
    }

    pub fn with_glossary(mut self, glossary: GlossarySelection) -> Self {
        self.glossary = glossary;
        self
    }

    fn validate(&self) -> MtResult<()> {
        validate_locale(&self.source)?;
        validate_locale(&self.target)?;
        if !EN_VARIANTS.contains(&self.en_variant.as_str()) {
            return Err(MtError::InvalidLocale(format!(
                "English variant must be one of {:?}, got {}",
                EN_VARIANTS, self.en_variant
            )));
        }
        Ok(())
    }

    /// Source code as sent to the vendor (`en-gb` → `EN`)
    pub fn vendor_source(&self) -> String {
        normalize_source_lang(&self.source)
    }

    /// Target code as sent to the vendor (`en` → `EN-GB`)
    pub fn vendor_target(&self) -> String {
        resolve_target_lang(&self.target, &self.en_variant)
    }

    /// Base language pair used for glossary names and lookups
    pub fn glossary_pair(&self) -> (String, String) {
        (
            normalize_source_lang(&self.source),
            normalize_source_lang(&self.target),
        )
    }
}

/// The translation backend a run talks to
pub enum Backend {
    DeepL(DeepLProvider),
    Mock(MockTranslator),
}

impl Backend {
    pub fn translator(&self) -> &dyn MachineTranslator {
        match self {
            Backend::DeepL(provider) => provider,
            Backend::Mock(mock) => mock,
        }
    }

    /// Glossary store, when the backend has one
    pub fn glossary_store(&self) -> Option<&dyn GlossaryStore> {
        match self {
            Backend::DeepL(provider) => Some(provider),
            Backend::Mock(_) => None,
        }
    }
}

/// Credentials and backend choice
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    api_key: Option<String>,
    api_url: Option<String>,
    pub mock: bool,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("api_url", &self.api_url)
            .field("mock", &self.mock)
            .finish()
    }
}

impl Settings {
    /// Read settings from the process environment
    pub fn from_env(mock: bool) -> MtResult<Self> {
        Self::from_lookup(mock, |name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`
    ///
    /// Fails with [`MtError::ConfigError`] when no key is available and the
    /// mock backend was not requested.
    pub fn from_lookup<F>(mock: bool, lookup: F) -> MtResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let api_key = non_empty(API_KEY_VAR);
        if api_key.is_none() && !mock {
            return Err(MtError::ConfigError(format!(
                "{} environment variable not set (export {}=your_key, or pass --mock)",
                API_KEY_VAR, API_KEY_VAR
            )));
        }

        Ok(Self {
            api_key,
            api_url: non_empty(API_URL_VAR),
            mock,
        })
    }

    /// Build the backend selected by these settings
    pub fn backend(&self) -> MtResult<Backend> {
        if self.mock {
            return Ok(Backend::Mock(MockTranslator::new(MockMode::Suffix)));
        }

        let api_key = self
            .api_key
            .clone()
            .ok_or_else(|| MtError::ConfigError(format!("{} not set", API_KEY_VAR)))?;
        let provider = DeepLProvider::new(api_key)?;
        Ok(Backend::DeepL(match &self.api_url {
            Some(url) => provider.with_base_url(url),
            None => provider,
        }))
    }

    /// Request options for `languages`, glossary resolved against `backend`
    ///
    /// A glossary that cannot be found is logged and skipped.
    pub async fn translate_options(
        &self,
        backend: &Backend,
        languages: &Languages,
    ) -> MtResult<TranslateOptions> {
        languages.validate()?;

        let glossary_id = match backend.glossary_store() {
            Some(store) => {
                let (src, tgt) = languages.glossary_pair();
                resolve_glossary(store, &languages.glossary, &src, &tgt).await
            }
            None => None,
        };

        Ok(
            TranslateOptions::new(&languages.vendor_source(), &languages.vendor_target())
                .with_glossary(glossary_id),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let result = Settings::from_lookup(false, lookup(&[]));
        assert!(matches!(result, Err(MtError::ConfigError(_))));
    }

    #[test]
    fn test_blank_key_is_missing() {
        let result = Settings::from_lookup(false, lookup(&[(API_KEY_VAR, "  ")]));
        assert!(matches!(result, Err(MtError::ConfigError(_))));
    }

    #[test]
    fn test_mock_needs_no_key() {
        let settings = Settings::from_lookup(true, lookup(&[])).unwrap();
        assert!(matches!(settings.backend().unwrap(), Backend::Mock(_)));
    }

    #[test]
    fn test_api_url_override() {
        let settings = Settings::from_lookup(
            false,
            lookup(&[(API_KEY_VAR, "abc:fx"), (API_URL_VAR, "http://localhost:9999/")]),
        )
        .unwrap();
        match settings.backend().unwrap() {
            Backend::DeepL(provider) => assert_eq!(provider.base_url(), "http://localhost:9999"),
            Backend::Mock(_) => panic!("expected DeepL backend"),
        }
    }

    #[test]
    fn test_debug_hides_key() {
        let settings = Settings::from_lookup(false, lookup(&[(API_KEY_VAR, "secret-key")])).unwrap();
        assert!(!format!("{:?}", settings).contains("secret-key"));
    }

    #[test]
    fn test_language_codes() {
        let langs = Languages::new("en-gb", "en").with_en_variant("en-us");
        assert_eq!(langs.vendor_source(), "EN");
        assert_eq!(langs.vendor_target(), "EN-US");
        assert_eq!(langs.glossary_pair(), ("EN".to_string(), "EN".to_string()));

        let langs = Languages::new("EN", "pt-br");
        assert_eq!(langs.vendor_target(), "PT-BR");
        assert_eq!(langs.glossary_pair().1, "PT");
    }

    #[tokio::test]
    async fn test_translate_options_for_mock() {
        let settings = Settings::from_lookup(true, lookup(&[])).unwrap();
        let backend = settings.backend().unwrap();
        let langs = Languages::new("en", "de").with_glossary(GlossarySelection::Auto);

        let opts = settings.translate_options(&backend, &langs).await.unwrap();
        assert_eq!(opts, TranslateOptions::new("EN", "DE"));
    }

    #[tokio::test]
    async fn test_translate_options_rejects_bad_variant() {
        let settings = Settings::from_lookup(true, lookup(&[])).unwrap();
        let backend = settings.backend().unwrap();
        let langs = Languages::new("en", "en").with_en_variant("EN-AU");
        assert!(matches!(
            settings.translate_options(&backend, &langs).await,
            Err(MtError::InvalidLocale(_))
        ));
    }
}
