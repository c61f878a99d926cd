//! Glossary terms from a shared spreadsheet
//!
//! The sheet has one column per language (named `English`, `German`, ...) and
//! an optional `Active` column gating which rows count. It is fetched as CSV,
//! turned into source → target term pairs for each direction, saved locally
//! and pushed to the vendor as glossaries.

use crate::mt::error::{MtError, MtResult};
use crate::mt::glossary::{GlossaryInfo, GlossaryStore, ensure_glossary, glossary_name};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{info, warn};

/// Optional row gate column
pub const ACTIVE_COLUMN: &str = "Active";

/// Language code → sheet column name
pub const LANGUAGE_COLUMNS: [(&str, &str); 3] =
    [("EN", "English"), ("DE", "German"), ("FR", "French")];

/// Direction synced when not building every pair
pub const DEFAULT_DIRECTION: (&str, &str) = ("EN", "DE");

/// A parsed sheet row, keyed by header
pub type Row = HashMap<String, String>;

static SHEET_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/d/([a-zA-Z0-9_-]+)/").expect("sheet id pattern"));

static SHEET_GID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?#&]gid=(\d+)").expect("sheet gid pattern"));

/// Convert a Google Sheets edit URL into its CSV export URL
///
/// ```ignore
/// let url = sheet_csv_url("https://docs.google.com/spreadsheets/d/abc123/edit?gid=42#gid=42")?;
/// assert_eq!(url, "https://docs.google.com/spreadsheets/d/abc123/export?format=csv&gid=42");
/// ```
pub fn sheet_csv_url(edit_url: &str) -> MtResult<String> {
    let sheet_id = SHEET_ID
        .captures(edit_url)
        .map(|c| c[1].to_string())
        .ok_or_else(|| {
            MtError::SheetError(format!("Could not extract sheet id from URL: {}", edit_url))
        })?;
    let gid = SHEET_GID
        .captures(edit_url)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| "0".to_string());

    Ok(format!(
        "https://docs.google.com/spreadsheets/d/{}/export?format=csv&gid={}",
        sheet_id, gid
    ))
}

/// Download CSV text from a public export URL
pub async fn fetch_csv(url: &str) -> MtResult<String> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| MtError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(MtError::SheetError(format!(
            "Fetching {} failed with HTTP {}",
            url, status
        )));
    }
    Ok(response.text().await?)
}

/// Parse CSV text into header-keyed rows
///
/// Short rows are accepted; their missing cells are absent from the row.
pub fn read_rows(csv_text: &str) -> MtResult<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(csv_text.as_bytes());
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Whether an `Active` cell marks its row as included
///
/// A missing cell counts as active.
pub fn is_truthy(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(v) => matches!(
            v.trim().to_lowercase().as_str(),
            "true" | "1" | "yes" | "y" | "x"
        ),
    }
}

/// Collect `src_col → tgt_col` term pairs from active rows
///
/// Values are trimmed, rows with an empty side are skipped and a repeated
/// source term keeps the last row's target.
pub fn build_pairs(rows: &[Row], src_col: &str, tgt_col: &str) -> BTreeMap<String, String> {
    let mut pairs = BTreeMap::new();
    for row in rows {
        if let Some(active) = row.get(ACTIVE_COLUMN)
            && !is_truthy(Some(active))
        {
            continue;
        }
        let src = row.get(src_col).map(|s| s.trim()).unwrap_or_default();
        let tgt = row.get(tgt_col).map(|s| s.trim()).unwrap_or_default();
        if !src.is_empty() && !tgt.is_empty() {
            pairs.insert(src.to_string(), tgt.to_string());
        }
    }
    pairs
}

/// Write pairs to `<dir>/<SRC>_<TGT>.csv` with a `SRC,TGT` header
pub fn save_pairs_csv(
    pairs: &BTreeMap<String, String>,
    source_lang: &str,
    target_lang: &str,
    dir: &Path,
) -> MtResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}_{}.csv", source_lang, target_lang));

    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record([source_lang, target_lang])?;
    for (src, tgt) in pairs {
        writer.write_record([src, tgt])?;
    }
    writer.flush()?;

    info!(path = %path.display(), entries = pairs.len(), "Saved local glossary CSV");
    Ok(path)
}

/// Language codes whose column appears in the sheet header
///
/// Fails when none of the known language columns is present; warns about
/// the ones that are missing otherwise.
pub fn present_languages(rows: &[Row]) -> MtResult<Vec<&'static str>> {
    let Some(first) = rows.first() else {
        return Err(MtError::SheetError(
            "No rows found in CSV (empty or headers missing)".to_string(),
        ));
    };

    let (present, missing): (Vec<&(&str, &str)>, Vec<&(&str, &str)>) = LANGUAGE_COLUMNS
        .iter()
        .partition(|(_, column)| first.contains_key(*column));

    if present.is_empty() {
        let expected: Vec<&str> = LANGUAGE_COLUMNS.iter().map(|(_, c)| *c).collect();
        return Err(MtError::SheetError(format!(
            "None of the language columns were found; expected any of {:?}",
            expected
        )));
    }
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|(_, c)| *c).collect();
        warn!("Missing columns (skipping directions involving them): {:?}", names);
    }

    Ok(present.into_iter().map(|(code, _)| *code).collect())
}

/// Directions to sync: the default pair, or every ordered pair of `languages`
pub fn directions(languages: &[&str], all_directions: bool) -> Vec<(String, String)> {
    if !all_directions {
        let (src, tgt) = DEFAULT_DIRECTION;
        if languages.contains(&src) && languages.contains(&tgt) {
            return vec![(src.to_string(), tgt.to_string())];
        }
        return Vec::new();
    }

    let mut out = Vec::new();
    for src in languages {
        for tgt in languages {
            if src != tgt {
                out.push((src.to_string(), tgt.to_string()));
            }
        }
    }
    out
}

/// Sheet column holding `code` terms
pub fn language_column(code: &str) -> Option<&'static str> {
    LANGUAGE_COLUMNS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, column)| *column)
}

/// Build, save and push a glossary for each direction
///
/// Directions without any pair are skipped. Returns the glossaries that now
/// exist on the vendor side.
pub async fn sync_glossaries<S: GlossaryStore + ?Sized>(
    store: &S,
    rows: &[Row],
    directions: &[(String, String)],
    prefix: &str,
    out_dir: &Path,
) -> MtResult<Vec<GlossaryInfo>> {
    let mut synced = Vec::new();

    for (src, tgt) in directions {
        let (Some(src_col), Some(tgt_col)) = (language_column(src), language_column(tgt)) else {
            warn!("No sheet column for {}->{}; skipping", src, tgt);
            continue;
        };

        let pairs = build_pairs(rows, src_col, tgt_col);
        if pairs.is_empty() {
            info!("No {}->{} pairs found, nothing to sync", src, tgt);
            continue;
        }

        save_pairs_csv(&pairs, src, tgt, out_dir)?;

        let name = glossary_name(prefix, src, tgt);
        info!(
            glossary = %name,
            entries = pairs.len(),
            "Syncing glossary ({}->{})",
            src,
            tgt
        );
        let glossary = ensure_glossary(store, &name, src, tgt, &pairs).await?;
        info!(glossary = %name, id = %glossary.glossary_id, "Glossary ready");
        synced.push(glossary);
    }

    Ok(synced)
}
