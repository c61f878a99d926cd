//! PDF in, PDF out
//!
//! Text is pulled out of a PDF with `pdftotext`, translated as plain text,
//! re-flowed into a minimal HTML page and printed with `weasyprint`. The
//! original layout is not kept.

use crate::mt::error::{MtError, MtResult};
use crate::mt::translator::{MachineTranslator, TranslateOptions};
use crate::pipeline::translate_plain_text;
use crate::template::escape::escape_html_text;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;
use tracing::{info, warn};

/// Body of the output document when the input had no extractable text
pub const NO_CONTENT_SENTINEL: &str = "[No extractable content found.]";

const PAGE_STYLE: &str = "@page { size: A4; margin: 15mm; } \
body { font-family: Helvetica, Arial, sans-serif; font-size: 12pt; line-height: 1.4; }";

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("paragraph break pattern"));

/// Run an external tool and return its stdout
///
/// A missing binary is reported with `install_hint`.
fn run_tool(program: &str, args: &[&str], install_hint: &str) -> MtResult<Vec<u8>> {
    let output = Command::new(program).args(args).output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            MtError::RenderError(format!("{} not found. {}", program, install_hint))
        } else {
            MtError::RenderError(format!("Failed to execute {}: {}", program, e))
        }
    })?;

    if !output.status.success() {
        return Err(MtError::RenderError(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(output.stdout)
}

fn path_arg(path: &Path) -> MtResult<&str> {
    path.to_str().ok_or_else(|| {
        MtError::Io(format!("Path is not valid UTF-8: {}", path.display()))
    })
}

/// Extract the text of a PDF, layout discarded
///
/// Runs `pdftotext -enc UTF-8 <pdf> -`.
pub fn extract_text(pdf_path: &Path) -> MtResult<String> {
    let stdout = run_tool(
        "pdftotext",
        &["-enc", "UTF-8", path_arg(pdf_path)?, "-"],
        "Install poppler (e.g. `brew install poppler` or `apt install poppler-utils`).",
    )?;
    let text = String::from_utf8_lossy(&stdout).replace('\r', "");
    // pdftotext separates pages with form feeds
    Ok(text.replace('\u{c}', "\n\n").trim().to_string())
}

/// Print an HTML file to PDF with `weasyprint`
pub fn render_pdf(html_path: &Path, pdf_path: &Path) -> MtResult<()> {
    run_tool(
        "weasyprint",
        &[path_arg(html_path)?, path_arg(pdf_path)?],
        "Install it with `brew install weasyprint` or `pip install weasyprint`.",
    )?;
    info!(path = %pdf_path.display(), "Wrote PDF");
    Ok(())
}

/// Re-flow plain text into a minimal printable HTML page
///
/// Each blank-line separated paragraph becomes one escaped `<p>`; single
/// line breaks inside a paragraph become `<br>`.
pub fn text_to_html(text: &str) -> String {
    let body: String = PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            let lines: Vec<String> = p.lines().map(|l| escape_html_text(l.trim())).collect();
            format!("<p>{}</p>\n", lines.join("<br>\n"))
        })
        .collect();

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        PAGE_STYLE, body
    )
}

/// Input PDF: `name` inside `folder`, or the first `*.pdf` in it by name
pub fn find_input_pdf(folder: &Path, name: Option<&str>) -> MtResult<PathBuf> {
    if !folder.is_dir() {
        return Err(MtError::Io(format!("Folder not found: {}", folder.display())));
    }

    let path = match name {
        Some(name) => folder.join(name),
        None => {
            let mut pdfs: Vec<PathBuf> = std::fs::read_dir(folder)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| {
                    p.extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
                })
                .collect();
            pdfs.sort();
            pdfs.into_iter().next().ok_or_else(|| {
                MtError::Io(format!("No PDF found in folder: {}", folder.display()))
            })?
        }
    };

    if !path.is_file() {
        return Err(MtError::Io(format!("File not found: {}", path.display())));
    }
    Ok(path)
}

/// `<stem>_translated_<tgt>.pdf` next to the input
pub fn translated_pdf_path(pdf_in: &Path, target_lang: &str) -> PathBuf {
    let stem = pdf_in
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    pdf_in.with_file_name(format!(
        "{}_translated_{}.pdf",
        stem,
        target_lang.to_lowercase()
    ))
}

/// Translate the text of `pdf_in` and print it to `pdf_out`
///
/// An input without extractable text still produces a document, holding
/// [`NO_CONTENT_SENTINEL`].
pub async fn translate_pdf<T: MachineTranslator + ?Sized>(
    translator: &T,
    pdf_in: &Path,
    pdf_out: &Path,
    opts: &TranslateOptions,
) -> MtResult<()> {
    info!(path = %pdf_in.display(), "Reading PDF");
    let text = extract_text(pdf_in)?;
    if text.is_empty() {
        warn!("No text extracted (scanned PDF or unusual layout?); writing placeholder document");
    } else {
        info!(chars = text.chars().count(), "Extracted text");
    }

    let translated = translate_plain_text(translator, &text, opts).await?;
    let body = if translated.trim().is_empty() {
        NO_CONTENT_SENTINEL
    } else {
        translated.as_str()
    };

    let html_path = pdf_out.with_extension("html");
    std::fs::write(&html_path, text_to_html(body))?;
    render_pdf(&html_path, pdf_out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_text_to_html_paragraphs() {
        let html = text_to_html("First line\nsecond line\n\n\n  R&D <lab>  \n\n");
        assert!(html.contains("<p>First line<br>\nsecond line</p>\n"));
        assert!(html.contains("<p>R&amp;D &lt;lab&gt;</p>\n"));
        assert_eq!(html.matches("<p>").count(), 2);
        assert!(html.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn test_text_to_html_sentinel() {
        let html = text_to_html(NO_CONTENT_SENTINEL);
        assert!(html.contains("<p>[No extractable content found.]</p>"));
    }

    #[test]
    fn test_translated_pdf_path() {
        let out = translated_pdf_path(Path::new("/docs/EPD Report.pdf"), "EN-GB");
        assert_eq!(out, PathBuf::from("/docs/EPD Report_translated_en-gb.pdf"));
    }

    #[test]
    fn test_find_input_pdf_picks_first_by_name() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.pdf"), b"%PDF").unwrap();
        fs::write(dir.path().join("a.PDF"), b"%PDF").unwrap();
        fs::write(dir.path().join("0.txt"), b"x").unwrap();

        let found = find_input_pdf(dir.path(), None).unwrap();
        assert_eq!(found.file_name().unwrap(), "a.PDF");
    }

    #[test]
    fn test_find_input_pdf_errors() {
        let dir = TempDir::new().unwrap();
        assert!(find_input_pdf(dir.path(), None).is_err());
        assert!(find_input_pdf(dir.path(), Some("missing.pdf")).is_err());
        assert!(find_input_pdf(&dir.path().join("nope"), None).is_err());
    }

    #[test]
    fn test_missing_tool_reports_hint() {
        let err = run_tool("jinja-mt-no-such-tool", &[], "Install it.").unwrap_err();
        match err {
            MtError::RenderError(msg) => {
                assert!(msg.contains("not found"));
                assert!(msg.contains("Install it."));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
