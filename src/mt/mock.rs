//! Mock Machine Translator for testing
//!
//! This module provides a deterministic, API-free translator for testing
//! the pipeline without requiring API keys or network access. Every request
//! is recorded so tests can assert exactly what would have been sent.
//!
//! # Example
//!
//! ```ignore
//! use jinja_mt::mt::{MachineTranslator, MockMode, MockTranslator, TranslateOptions};
//!
//! #[tokio::test]
//! async fn test_translation() {
//!     let mock = MockTranslator::new(MockMode::Suffix);
//!     let opts = TranslateOptions::new("EN", "DE");
//!     assert_eq!(mock.translate("hello", &opts).await.unwrap(), "hello_de");
//! }
//! ```

use crate::mt::error::{MtError, MtResult};
use crate::mt::translator::{MachineTranslator, TranslateOptions};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Mock translation modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append target suffix: "hello" → "hello_de"
    Suffix,

    /// Use predefined mappings for realistic translations
    /// (text, target_lang lower-cased) → translation, falling back to `Suffix`
    Mappings(HashMap<(String, String), String>),

    /// Reverse the order of whitespace-separated words, keeping every markup
    /// tag (`<...>`) as one word; simulates prose reordering around tags
    Reorder,

    /// Simulate API errors
    Error(String),

    /// No-op: return input unchanged
    NoOp,
}

/// Mock translator that simulates various translation scenarios
#[derive(Debug)]
pub struct MockTranslator {
    mode: MockMode,
    /// Every batch received, in call order (single translations are batches of one)
    requests: Mutex<Vec<Vec<String>>>,
}

impl MockTranslator {
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<Vec<String>> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Number of vendor calls made so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    fn record(&self, texts: &[String]) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(texts.to_vec());
        }
    }

    /// Apply translation logic based on the mode
    fn apply_translation(&self, text: &str, opts: &TranslateOptions) -> MtResult<String> {
        let target = opts.target_lang.to_lowercase();
        match &self.mode {
            MockMode::Suffix => Ok(format!("{}_{}", text, target)),
            MockMode::Mappings(map) => Ok(map
                .get(&(text.to_string(), target.clone()))
                .cloned()
                .unwrap_or_else(|| format!("{}_{}", text, target))),
            MockMode::Reorder => {
                let words = markup_words(text);
                Ok(words.into_iter().rev().collect::<Vec<_>>().join(" "))
            }
            MockMode::Error(msg) => Err(MtError::TranslationError(msg.clone())),
            MockMode::NoOp => Ok(text.to_string()),
        }
    }
}

/// Split on whitespace outside of `<...>` tags
fn markup_words(text: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start: Option<usize> = None;
    let mut in_tag = false;

    for (i, c) in text.char_indices() {
        match c {
            '<' => {
                in_tag = true;
                start.get_or_insert(i);
            }
            '>' => {
                in_tag = false;
                start.get_or_insert(i);
            }
            c if c.is_whitespace() && !in_tag => {
                if let Some(s) = start.take() {
                    words.push(&text[s..i]);
                }
            }
            _ => {
                start.get_or_insert(i);
            }
        }
    }
    if let Some(s) = start {
        words.push(&text[s..]);
    }
    words
}

#[async_trait]
impl MachineTranslator for MockTranslator {
    async fn translate(&self, text: &str, opts: &TranslateOptions) -> MtResult<String> {
        self.record(&[text.to_string()]);
        self.apply_translation(text, opts)
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        opts: &TranslateOptions,
    ) -> MtResult<Vec<String>> {
        self.record(texts);
        texts
            .iter()
            .map(|text| self.apply_translation(text, opts))
            .collect()
    }

    fn provider_name(&self) -> &str {
        "Mock Translator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(target: &str) -> TranslateOptions {
        TranslateOptions::new("EN", target)
    }

    // ========== Suffix Mode Tests ==========

    #[tokio::test]
    async fn test_suffix_single_translation() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let result = mock.translate("hello", &opts("DE")).await.unwrap();
        assert_eq!(result, "hello_de");
    }

    #[tokio::test]
    async fn test_suffix_batch_translation() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let texts = vec!["hello".to_string(), "world".to_string()];
        let results = mock.translate_batch(&texts, &opts("FR")).await.unwrap();
        assert_eq!(results, vec!["hello_fr", "world_fr"]);
    }

    // ========== Mapping Mode Tests ==========

    #[tokio::test]
    async fn test_mapping_with_fallback() {
        let mut map = HashMap::new();
        map.insert(
            ("hello".to_string(), "de".to_string()),
            "hallo".to_string(),
        );

        let mock = MockTranslator::new(MockMode::Mappings(map));
        assert_eq!(mock.translate("hello", &opts("DE")).await.unwrap(), "hallo");
        assert_eq!(
            mock.translate("unknown", &opts("DE")).await.unwrap(),
            "unknown_de"
        );
    }

    // ========== Reorder Mode Tests ==========

    #[tokio::test]
    async fn test_reorder_simple_reversal() {
        let mock = MockTranslator::new(MockMode::Reorder);
        let result = mock.translate("one two three", &opts("JA")).await.unwrap();
        assert_eq!(result, "three two one");
    }

    #[tokio::test]
    async fn test_reorder_keeps_tags_whole() {
        let mock = MockTranslator::new(MockMode::Reorder);
        let text = r#"Hello <x-jinja data-k="J000000"></x-jinja> world"#;
        let result = mock.translate(text, &opts("JA")).await.unwrap();
        assert_eq!(result, r#"world <x-jinja data-k="J000000"></x-jinja> Hello"#);
    }

    #[test]
    fn test_markup_words_tag_with_spaces() {
        let words = markup_words(r#"<a href="x y">link</a>  tail"#);
        assert_eq!(words, vec![r#"<a href="x y">link</a>"#, "tail"]);
    }

    // ========== Error Mode Tests ==========

    #[tokio::test]
    async fn test_error_mode_returns_error() {
        let mock = MockTranslator::new(MockMode::Error("API unavailable".to_string()));
        match mock.translate("hello", &opts("DE")).await {
            Err(MtError::TranslationError(msg)) => assert_eq!(msg, "API unavailable"),
            _ => panic!("Expected TranslationError"),
        }
    }

    #[tokio::test]
    async fn test_error_mode_batch_fails() {
        let mock = MockTranslator::new(MockMode::Error("Network error".to_string()));
        let texts = vec!["hello".to_string()];
        assert!(mock.translate_batch(&texts, &opts("DE")).await.is_err());
    }

    // ========== NoOp Mode Tests ==========

    #[tokio::test]
    async fn test_noop_batch_returns_unchanged() {
        let mock = MockTranslator::new(MockMode::NoOp);
        let texts = vec!["hello".to_string(), "world".to_string()];
        let results = mock.translate_batch(&texts, &opts("DE")).await.unwrap();
        assert_eq!(results, texts);
    }

    // ========== Recording Tests ==========

    #[tokio::test]
    async fn test_requests_are_recorded() {
        let mock = MockTranslator::new(MockMode::NoOp);
        assert_eq!(mock.call_count(), 0);

        mock.translate("a", &opts("DE")).await.unwrap();
        mock.translate_batch(&["b".to_string(), "c".to_string()], &opts("DE"))
            .await
            .unwrap();

        assert_eq!(mock.call_count(), 2);
        assert_eq!(
            mock.requests(),
            vec![vec!["a".to_string()], vec!["b".to_string(), "c".to_string()]]
        );
    }

    #[test]
    fn test_provider_name() {
        let mock = MockTranslator::new(MockMode::Suffix);
        assert_eq!(mock.provider_name(), "Mock Translator");
    }
}
