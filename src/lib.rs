//! Machine translation for Jinja templates, rendered HTML and PDFs
//!
//! Templates are translated without damaging their syntax: quoted heading
//! text is exposed to the vendor, every other Jinja construct is masked as an
//! inert element the vendor leaves alone, and everything is put back after
//! translation.
//!
//! # Workflow Example
//!
//! ```ignore
//! use jinja_mt::config::{Languages, Settings};
//! use jinja_mt::mt::GlossarySelection;
//! use jinja_mt::pipeline::translate_template;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 1. Credentials from DEEPL_API_KEY
//!     let settings = Settings::from_env(false)?;
//!     let backend = settings.backend()?;
//!
//!     // 2. Languages and glossary
//!     let languages = Languages::new("EN", "DE").with_glossary(GlossarySelection::Auto);
//!     let opts = settings.translate_options(&backend, &languages).await?;
//!
//!     // 3. Translate with template syntax preserved
//!     let source = r#"<h2>{{ heading2("Our product") }}</h2><p>{{ product.name }}</p>"#;
//!     let translated = translate_template(backend.translator(), source, &opts).await?;
//!     println!("{}", translated);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod mt;
pub mod pdf;
pub mod pipeline;
pub mod render;
pub mod sheet;
pub mod template;


// Re-export main types for convenient access
pub use config::{Backend, Languages, Settings};
pub use mt::{MachineTranslator, MtError, MtResult, TranslateOptions};
pub use pipeline::{translate_html, translate_plain_text, translate_template};
pub use template::{MaskedDocument, PlaceholderMap, prepare, restore};
