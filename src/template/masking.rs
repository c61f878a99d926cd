//! Generic Jinja syntax masking
//!
//! Every Jinja construct left in a document (after heading calls have been
//! dealt with) is replaced by an inert, empty placeholder element before the
//! HTML goes to the vendor:
//!
//! ```text
//! <p>Hello {{ user.name }}</p>
//! <p>Hello <x-jinja data-k="J000000"></x-jinja></p>
//! ```
//!
//! The vendor is told to leave `x-jinja` alone; afterwards each placeholder is
//! replaced by the exact source text it stood for.
//!
//! Construct classes are masked in strict priority order: raw blocks, then
//! comments, then statements, then expressions. A raw block can contain text
//! that looks like any of the other three, so it must become one opaque unit
//! before they are searched for.

use crate::mt::error::{MtError, MtResult};
use crate::template::data::PlaceholderMap;
use regex::{Captures, Regex};
use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::LazyLock;

/// Element name of generic placeholders
pub const PLACEHOLDER_TAG: &str = "x-jinja";

/// Element names the masking pipeline introduces; a document that already
/// contains one of them cannot be masked safely
pub const RESERVED_TAGS: [&str; 3] = ["x-jinja", "x-h2", "x-h3"];

static RAW_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{%[-+]?\s*raw\s*[-+]?%\}.*?\{%[-+]?\s*endraw\s*[-+]?%\}")
        .expect("raw block pattern")
});
static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{#.*?#\}").expect("comment pattern"));
static STATEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{%.*?%\}").expect("statement pattern"));
static EXPRESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{\{.*?\}\}").expect("expression pattern"));

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<x-jinja\s+data-k\s*=\s*"(J\d{6,})"\s*>\s*</x-jinja\s*>"#)
        .expect("placeholder pattern")
});

/// The four Jinja construct classes, in masking priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructClass {
    Raw,
    Comment,
    Statement,
    Expression,
}

impl ConstructClass {
    pub const PRIORITY: [ConstructClass; 4] = [
        ConstructClass::Raw,
        ConstructClass::Comment,
        ConstructClass::Statement,
        ConstructClass::Expression,
    ];

    fn pattern(self) -> &'static Regex {
        match self {
            ConstructClass::Raw => &RAW_BLOCK,
            ConstructClass::Comment => &COMMENT,
            ConstructClass::Statement => &STATEMENT,
            ConstructClass::Expression => &EXPRESSION,
        }
    }
}

/// Placeholder element for `key`
pub fn placeholder_tag(key: &str) -> String {
    format!(r#"<{PLACEHOLDER_TAG} data-k="{key}"></{PLACEHOLDER_TAG}>"#)
}

/// Fail if `src` already contains markup the pipeline reserves for itself
pub fn check_reserved_markup(src: &str) -> MtResult<()> {
    let lower = src.to_ascii_lowercase();
    for tag in RESERVED_TAGS {
        if lower.contains(&format!("<{}", tag)) {
            return Err(MtError::PlaceholderError(format!(
                "Document already contains reserved <{}> markup",
                tag
            )));
        }
    }
    Ok(())
}

/// Replace every placeholder inside `fragment` by its original text
fn expand(fragment: &str, map: &PlaceholderMap) -> String {
    PLACEHOLDER
        .replace_all(fragment, |caps: &Captures| {
            map.get(&caps[1]).unwrap_or(&caps[0]).to_string()
        })
        .into_owned()
}

/// Mask all Jinja constructs in `src`, recording originals in `map`
///
/// For each class in priority order the leftmost remaining match in the
/// whole current text is replaced, until none is left. A match of a later
/// class may enclose placeholders from an earlier one (`{{ f({% x %}) }}`);
/// its recorded original is expanded back to pure source text, so every key
/// maps to exact source and unmasking needs a single pass.
pub fn mask(src: &str, map: &mut PlaceholderMap) -> String {
    let mut masked = src.to_string();

    for class in ConstructClass::PRIORITY {
        let pattern = class.pattern();
        while let Some(range) = pattern.find(&masked).map(|m| m.range()) {
            let original = expand(&masked[range.clone()], map);
            let key = map.insert(original);
            masked.replace_range(range, &placeholder_tag(&key));
        }
    }

    masked
}

/// Keys of all placeholders present in `text`, in order of appearance
pub fn placeholder_keys(text: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Fail if any placeholder of `masked` is missing from `translated`
pub fn verify_placeholders(masked: &str, translated: &str) -> MtResult<()> {
    let present: BTreeSet<String> = placeholder_keys(translated).into_iter().collect();
    let missing: Vec<String> = placeholder_keys(masked)
        .into_iter()
        .filter(|key| !present.contains(key))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(MtError::PlaceholderError(format!(
            "Placeholders lost in translation: {}",
            missing.join(", ")
        )))
    }
}

/// Replace every placeholder in `translated` by its original source text
///
/// A key absent from `map` means the masked text was not produced by this
/// map; that is an internal defect and aborts the document.
pub fn unmask(translated: &str, map: &PlaceholderMap) -> MtResult<String> {
    let mut unknown: Option<String> = None;
    let restored = PLACEHOLDER.replace_all(translated, |caps: &Captures| match map.get(&caps[1]) {
        Some(original) => original.to_string(),
        None => {
            unknown.get_or_insert_with(|| caps[1].to_string());
            caps[0].to_string()
        }
    });

    match unknown {
        Some(key) => Err(MtError::PlaceholderError(format!(
            "Unknown placeholder key {}",
            key
        ))),
        None => Ok(restored.into_owned()),
    }
}

/// Byte ranges of raw blocks and comments, which heading rewrites must not touch
pub fn opaque_regions(src: &str) -> Vec<Range<usize>> {
    let mut regions: Vec<Range<usize>> = RAW_BLOCK.find_iter(src).map(|m| m.range()).collect();
    let raw_count = regions.len();

    let comments: Vec<Range<usize>> = COMMENT
        .find_iter(src)
        .map(|m| m.range())
        .filter(|c| !regions[..raw_count].iter().any(|r| r.contains(&c.start)))
        .collect();
    regions.extend(comments);
    regions
}

/// True if `range` starts inside any of `regions`
pub fn in_regions(range: &Range<usize>, regions: &[Range<usize>]) -> bool {
    regions.iter().any(|r| r.contains(&range.start))
}
