//! Template-safe masking for machine translation
//!
//! A Jinja template is made safe for an HTML-translating vendor in three
//! stages, always in this order:
//!
//! 1. [`literals`] translates quoted literals inside non-literal heading
//!    arguments while the quotes are still visible.
//! 2. [`heading`] turns literal heading calls into wrapper elements so their
//!    text is translated with the rest of the HTML.
//! 3. [`masking`] replaces every remaining Jinja construct with an inert
//!    placeholder element.
//!
//! After translation the last two stages are undone in reverse order by
//! [`restore`]. Stage 1 needs the vendor and lives in
//! [`crate::pipeline::translate_template`]; the other two are pure and are
//! combined here.
//!
//! ```ignore
//! use jinja_mt::template::{prepare, restore};
//!
//! let doc = prepare(r#"<h2>{{ heading2("Hello") }}</h2><p>{{ name }}</p>"#)?;
//! // doc.text == r#"<h2><x-h2 data-k="H000000">Hello</x-h2></h2><p><x-jinja data-k="J000000"></x-jinja></p>"#
//! let restored = restore(&doc.text, &doc)?;
//! ```

pub mod data;
pub mod escape;
pub mod heading;
pub mod literals;
pub mod masking;

pub use data::{
    HeadingCall, HeadingCalls, HeadingLevel, LiteralSpan, MaskedDocument, PlaceholderMap,
};
pub use heading::{restore_heading_calls, wrap_literal_headings};
pub use literals::{find_embedded_literals, splice_literals, translate_embedded_literals};
pub use masking::{
    ConstructClass, PLACEHOLDER_TAG, check_reserved_markup, mask, placeholder_keys,
    placeholder_tag, unmask, verify_placeholders,
};

use crate::mt::error::MtResult;
use tracing::debug;

/// Wrap literal heading calls and mask all other Jinja syntax
pub fn prepare(src: &str) -> MtResult<MaskedDocument> {
    check_reserved_markup(src)?;

    let mut headings = HeadingCalls::new();
    let wrapped = wrap_literal_headings(src, &mut headings);

    let mut placeholders = PlaceholderMap::new();
    let text = mask(&wrapped, &mut placeholders);

    debug!(
        headings = headings.len(),
        placeholders = placeholders.len(),
        "Prepared template for translation"
    );

    Ok(MaskedDocument {
        text,
        placeholders,
        headings,
    })
}

/// Undo [`prepare`] on the (translated) masked text of `doc`
///
/// Fails when a placeholder of `doc` is missing from `translated`, or when
/// `translated` carries a placeholder `doc` never issued.
pub fn restore(translated: &str, doc: &MaskedDocument) -> MtResult<String> {
    verify_placeholders(&doc.text, translated)?;
    let unmasked = unmask(translated, &doc.placeholders)?;
    Ok(restore_heading_calls(&unmasked, &doc.headings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mt::error::MtError;

    #[test]
    fn test_prepare_restore_identity() {
        let src = r#"{% extends "base.j2" %}
{% block body %}
<h2>{{ heading2("Our product") }}</h2>
{# reviewer note #}
<p>Made by {{ company.name }} in {{ company.country }}.</p>
{% for f in product.features %}<li>{{ f }}</li>{% endfor %}
{% raw %}<code>{{ not_a_var }}</code>{% endraw %}
{% endblock %}"#;
        let doc = prepare(src).unwrap();
        assert!(!doc.text.contains("{{"));
        assert!(!doc.text.contains("{%"));
        assert!(doc.text.contains(r#"<x-h2 data-k="H000000">Our product</x-h2>"#));
        assert_eq!(restore(&doc.text, &doc).unwrap(), src);
    }

    #[test]
    fn test_heading_call_literal_roundtrip() {
        let src = r#"{{ heading2("Hello") }}"#;
        let doc = prepare(src).unwrap();
        assert_eq!(doc.text, r#"<x-h2 data-k="H000000">Hello</x-h2>"#);
        assert!(doc.placeholders.is_empty());
        assert_eq!(restore(&doc.text, &doc).unwrap(), src);
    }

    #[test]
    fn test_jinja_inside_heading_literal_survives() {
        let src = r#"{{ heading2("Price {{ p }}") }}"#;
        let doc = prepare(src).unwrap();
        assert_eq!(doc.placeholders.len(), 1);
        assert_eq!(restore(&doc.text, &doc).unwrap(), src);
    }

    #[test]
    fn test_prepare_rejects_reserved_markup() {
        let result = prepare(r#"<x-jinja data-k="J000000"></x-jinja>"#);
        assert!(matches!(result, Err(MtError::PlaceholderError(_))));
    }

    #[test]
    fn test_restore_fails_on_lost_placeholder() {
        let doc = prepare("<p>{{ a }}</p>").unwrap();
        assert!(restore("<p></p>", &doc).is_err());
    }
}
