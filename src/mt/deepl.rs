//! DeepL API provider for machine translation
//!
//! This module integrates with the DeepL API v2 for text and HTML
//! translation and for glossary management.
//!
//! # Authentication
//!
//! The provider loads the API key from the `DEEPL_API_KEY` environment
//! variable. Free-plan keys (suffix `:fx`) are sent to the free endpoint,
//! all other keys to the pro endpoint. `DEEPL_API_URL` overrides both.
//!
//! # Example
//!
//! ```ignore
//! use jinja_mt::mt::{DeepLProvider, MachineTranslator, TagHandling, TranslateOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = DeepLProvider::from_env()?;
//!     let opts = TranslateOptions::new("EN", "DE")
//!         .with_tag_handling(TagHandling::html_ignoring(&[]));
//!
//!     let result = provider.translate("<p>Hello, world!</p>", &opts).await?;
//!     println!("{}", result);
//!     Ok(())
//! }
//! ```

use crate::mt::error::{MtError, MtResult};
use crate::mt::glossary::{GlossaryInfo, GlossaryStore};
use crate::mt::translator::{
    MachineTranslator, TagHandling, TranslateOptions, normalize_source_lang, validate_locale,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::debug;

const FREE_API_URL: &str = "https://api-free.deepl.com";
const PRO_API_URL: &str = "https://api.deepl.com";

/// DeepL API v2 provider
///
/// Supports both single and batch translations with automatic request chunking,
/// and implements [`GlossaryStore`] for glossary lookup and synchronisation.
#[derive(Clone)]
pub struct DeepLProvider {
    /// API key for authentication
    api_key: String,
    /// HTTP client for async requests
    client: reqwest::Client,
    /// Base URL without the `/v2` path
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct GlossaryList {
    glossaries: Vec<GlossaryInfo>,
}

impl DeepLProvider {
    /// Maximum number of texts per API request
    const MAX_BATCH_SIZE: usize = 50;

    /// Maximum bytes per text (DeepL rejects request bodies above 128 KiB)
    const MAX_BYTES_PER_TEXT: usize = 128 * 1024;

    /// Create a new provider with an explicit API key
    ///
    /// # Returns
    ///
    /// * `Ok(Self)` - New provider instance
    /// * `Err(MtError)` - If API key is empty or HTTP client creation fails
    pub fn new(api_key: String) -> MtResult<Self> {
        if api_key.trim().is_empty() {
            return Err(MtError::ConfigError("API key cannot be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| MtError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = if api_key.ends_with(":fx") {
            FREE_API_URL
        } else {
            PRO_API_URL
        };

        Ok(Self {
            api_key,
            client,
            base_url: base_url.to_string(),
        })
    }

    /// Create a provider from `DEEPL_API_KEY` (and optional `DEEPL_API_URL`)
    ///
    /// # Returns
    ///
    /// * `Ok(Self)` - New provider instance
    /// * `Err(MtError::ConfigError)` - If the key is not set
    pub fn from_env() -> MtResult<Self> {
        let api_key = std::env::var("DEEPL_API_KEY").map_err(|_| {
            MtError::ConfigError("DEEPL_API_KEY environment variable not set".to_string())
        })?;

        let provider = Self::new(api_key)?;
        Ok(match std::env::var("DEEPL_API_URL") {
            Ok(url) if !url.trim().is_empty() => provider.with_base_url(&url),
            _ => provider,
        })
    }

    /// Point the provider at a different API host
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v2/{}", self.base_url, path)
    }

    fn auth_header(&self) -> String {
        format!("DeepL-Auth-Key {}", self.api_key)
    }

    /// Chunk a batch of texts into API-safe sizes
    fn chunk_batch(texts: &[String]) -> Vec<&[String]> {
        texts.chunks(Self::MAX_BATCH_SIZE).collect()
    }

    /// Map a non-success response to an error, consuming the body for context
    async fn check_status(response: reqwest::Response) -> MtResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        Err(if status.is_client_error() {
            MtError::ConfigError(format!("API client error ({}): {}", status, error_text))
        } else {
            MtError::TranslationError(format!("API server error ({}): {}", status, error_text))
        })
    }

    /// Build the JSON request body for one chunk
    fn request_body(texts: &[String], opts: &TranslateOptions) -> serde_json::Value {
        let mut body = json!({
            "text": texts,
            "source_lang": normalize_source_lang(&opts.source_lang),
            "target_lang": opts.target_lang.to_uppercase(),
        });

        if let Some(TagHandling::Html { ignore_tags }) = &opts.tag_handling {
            body["tag_handling"] = json!("html");
            if !ignore_tags.is_empty() {
                body["ignore_tags"] = json!(ignore_tags);
            }
        }

        if let Some(glossary_id) = &opts.glossary_id {
            body["glossary_id"] = json!(glossary_id);
        }

        body
    }

    /// Translate a single chunk of texts via the API
    async fn translate_chunk(
        &self,
        texts: &[String],
        opts: &TranslateOptions,
    ) -> MtResult<Vec<String>> {
        let body = Self::request_body(texts, opts);
        debug!(
            texts = texts.len(),
            target = %opts.target_lang,
            "Sending DeepL translate request"
        );

        let response = self
            .client
            .post(self.endpoint("translate"))
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let json: serde_json::Value = response.json().await.map_err(|e| {
            MtError::TranslationError(format!("Failed to parse API response: {}", e))
        })?;

        let translations = json["translations"].as_array().ok_or_else(|| {
            MtError::TranslationError(
                "Invalid API response: missing 'translations' array".to_string(),
            )
        })?;

        let results: Vec<String> = translations
            .iter()
            .map(|t| {
                t["text"].as_str().map(|s| s.to_string()).ok_or_else(|| {
                    MtError::TranslationError(
                        "Invalid API response: missing 'text' field".to_string(),
                    )
                })
            })
            .collect::<MtResult<_>>()?;

        if results.len() != texts.len() {
            return Err(MtError::TranslationError(format!(
                "API returned {} translations for {} texts",
                results.len(),
                texts.len()
            )));
        }

        Ok(results)
    }

    fn validate(opts: &TranslateOptions) -> MtResult<()> {
        validate_locale(&opts.source_lang)?;
        validate_locale(&opts.target_lang)
    }
}

impl std::fmt::Debug for DeepLProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepLProvider")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl MachineTranslator for DeepLProvider {
    async fn translate(&self, text: &str, opts: &TranslateOptions) -> MtResult<String> {
        Self::validate(opts)?;

        if text.is_empty() {
            return Ok(String::new());
        }

        if text.len() > Self::MAX_BYTES_PER_TEXT {
            return Err(MtError::TranslationError(format!(
                "Text exceeds maximum length of {} bytes",
                Self::MAX_BYTES_PER_TEXT
            )));
        }

        let results = self.translate_chunk(&[text.to_string()], opts).await?;
        Ok(results.into_iter().next().unwrap_or_default())
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        opts: &TranslateOptions,
    ) -> MtResult<Vec<String>> {
        Self::validate(opts)?;

        if texts.is_empty() {
            return Ok(Vec::new());
        }

        for (i, text) in texts.iter().enumerate() {
            if text.len() > Self::MAX_BYTES_PER_TEXT {
                return Err(MtError::TranslationError(format!(
                    "Text at index {} exceeds maximum length of {} bytes",
                    i,
                    Self::MAX_BYTES_PER_TEXT
                )));
            }
        }

        let mut all_results = Vec::with_capacity(texts.len());
        for chunk in Self::chunk_batch(texts) {
            let chunk_results = self.translate_chunk(chunk, opts).await?;
            all_results.extend(chunk_results);
        }

        Ok(all_results)
    }

    fn provider_name(&self) -> &str {
        "DeepL"
    }
}

#[async_trait]
impl GlossaryStore for DeepLProvider {
    async fn list_glossaries(&self) -> MtResult<Vec<GlossaryInfo>> {
        let response = self
            .client
            .get(self.endpoint("glossaries"))
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let list: GlossaryList = response
            .json()
            .await
            .map_err(|e| MtError::GlossaryError(format!("Failed to parse glossary list: {}", e)))?;
        Ok(list.glossaries)
    }

    async fn create_glossary(
        &self,
        name: &str,
        source_lang: &str,
        target_lang: &str,
        entries: &BTreeMap<String, String>,
    ) -> MtResult<GlossaryInfo> {
        validate_locale(source_lang)?;
        validate_locale(target_lang)?;

        let body = json!({
            "name": name,
            "source_lang": source_lang.to_uppercase(),
            "target_lang": target_lang.to_uppercase(),
            "entries": entries_to_tsv(entries),
            "entries_format": "tsv",
        });

        let response = self
            .client
            .post(self.endpoint("glossaries"))
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| MtError::GlossaryError(format!("Failed to parse created glossary: {}", e)))
    }

    async fn delete_glossary(&self, glossary_id: &str) -> MtResult<()> {
        let response = self
            .client
            .delete(self.endpoint(&format!("glossaries/{}", glossary_id)))
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }
}

/// Serialise glossary entries as DeepL TSV
///
/// Tabs and line breaks inside a term would corrupt the format and are
/// collapsed to single spaces.
fn entries_to_tsv(entries: &BTreeMap<String, String>) -> String {
    let clean = |s: &str| s.replace(['\t', '\r', '\n'], " ");
    entries
        .iter()
        .map(|(src, tgt)| format!("{}\t{}", clean(src), clean(tgt)))
        .collect::<Vec<_>>()
        .join("\n")
}
