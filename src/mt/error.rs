use thiserror::Error;

/// Error types for translation, masking and the surrounding I/O
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MtError {
    /// Missing or rejected configuration (API key, client error from the vendor)
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Language code that the vendor would not accept
    #[error("Invalid language code: {0}")]
    InvalidLocale(String),
    /// Transport failure talking to the vendor or fetching a sheet
    #[error("Network error: {0}")]
    NetworkError(String),
    /// Error during translation phase
    #[error("Translation error: {0}")]
    TranslationError(String),
    /// Glossary lookup, creation or deletion failed
    #[error("Glossary error: {0}")]
    GlossaryError(String),
    /// A placeholder was lost or is unknown to the masking map
    #[error("Placeholder error: {0}")]
    PlaceholderError(String),
    /// Template could not be loaded or rendered
    #[error("Template error: {0}")]
    TemplateError(String),
    /// Glossary sheet could not be fetched or parsed
    #[error("Sheet error: {0}")]
    SheetError(String),
    /// External document tool (pdftotext, weasyprint) failed
    #[error("Render error: {0}")]
    RenderError(String),
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<reqwest::Error> for MtError {
    fn from(e: reqwest::Error) -> Self {
        MtError::NetworkError(e.to_string())
    }
}

impl From<std::io::Error> for MtError {
    fn from(e: std::io::Error) -> Self {
        MtError::Io(e.to_string())
    }
}

impl From<csv::Error> for MtError {
    fn from(e: csv::Error) -> Self {
        MtError::SheetError(e.to_string())
    }
}

impl From<minijinja::Error> for MtError {
    fn from(e: minijinja::Error) -> Self {
        MtError::TemplateError(e.to_string())
    }
}

impl From<serde_json::Error> for MtError {
    fn from(e: serde_json::Error) -> Self {
        MtError::TemplateError(format!("Invalid JSON context: {}", e))
    }
}

/// Result type for MT operations
pub type MtResult<T> = Result<T, MtError>;
