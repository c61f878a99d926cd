use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use jinja_mt::config::{Backend, EN_VARIANTS, Languages, Settings};
use jinja_mt::mt::{DEFAULT_GLOSSARY_PREFIX, GlossarySelection, MtError, TranslateOptions};
use jinja_mt::{pdf, pipeline, render, sheet};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn language_args(cmd: Command, src: &'static str, tgt: &'static str) -> Command {
    cmd.arg(
        Arg::new("src")
            .long("src")
            .help("Source language code")
            .default_value(src),
    )
    .arg(
        Arg::new("tgt")
            .long("tgt")
            .help("Target language code")
            .default_value(tgt),
    )
    .arg(
        Arg::new("en-variant")
            .long("en-variant")
            .help("English variant used when the target is EN")
            .value_parser(EN_VARIANTS)
            .default_value(EN_VARIANTS[0]),
    )
    .arg(
        Arg::new("glossary")
            .long("glossary")
            .help(r#"Glossary name (e.g. "epd-EN-DE"), "auto" or "none""#)
            .default_value("auto"),
    )
}

fn cli() -> Command {
    Command::new("jinja-mt")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Translate Jinja templates, rendered HTML and PDFs with DeepL")
        .subcommand_required(true)
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .global(true)
                .help("Use the mock translator instead of DeepL (no API key needed)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .help("Show detailed progress")
                .action(ArgAction::SetTrue),
        )
        .subcommand(language_args(
            Command::new("template")
                .about("Translate a Jinja/HTML template, keeping template syntax intact")
                .arg(Arg::new("input").required(true).index(1))
                .arg(Arg::new("output").required(true).index(2)),
            "EN",
            "DE",
        ))
        .subcommand(language_args(
            Command::new("html")
                .about("Translate rendered HTML (script/style/code/pre untouched)")
                .arg(Arg::new("input").required(true).index(1))
                .arg(Arg::new("output").required(true).index(2)),
            "EN",
            "DE",
        ))
        .subcommand(language_args(
            Command::new("pdf")
                .about("Translate the text of a PDF into a new, re-flowed PDF")
                .arg(
                    Arg::new("folder")
                        .help("Folder holding the PDF")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("file")
                        .help("PDF file name (default: first *.pdf in the folder)")
                        .index(2),
                ),
            "DE",
            "EN",
        ))
        .subcommand(language_args(
            Command::new("render")
                .about("Render a template to HTML, optionally translate it, then print to PDF")
                .arg(
                    Arg::new("template")
                        .long("template")
                        .default_value("example.j2"),
                )
                .arg(
                    Arg::new("templates-dir")
                        .long("templates-dir")
                        .default_value("."),
                )
                .arg(
                    Arg::new("data")
                        .long("data")
                        .help("JSON file with the render context (default: sample data)"),
                )
                .arg(Arg::new("outdir").long("outdir").default_value("out"))
                .arg(
                    Arg::new("translate")
                        .long("translate")
                        .help("Translate the rendered HTML")
                        .action(ArgAction::SetTrue),
                ),
            "EN",
            "DE",
        ))
        .subcommand(
            Command::new("glossary")
                .about("Create or refresh DeepL glossaries from a Google Sheet")
                .arg(
                    Arg::new("sheet-url")
                        .help("Google Sheets edit URL")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("all-directions")
                        .long("all-directions")
                        .help("Build every direction among the languages present")
                        .action(ArgAction::SetTrue),
                )
                .arg(Arg::new("out").long("out").default_value("glossaries"))
                .arg(
                    Arg::new("prefix")
                        .long("prefix")
                        .default_value(DEFAULT_GLOSSARY_PREFIX),
                ),
        )
}

fn arg<'a>(matches: &'a ArgMatches, id: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .with_context(|| format!("Missing argument: {}", id))
}

fn languages(matches: &ArgMatches) -> Result<Languages> {
    Ok(Languages::new(arg(matches, "src")?, arg(matches, "tgt")?)
        .with_en_variant(arg(matches, "en-variant")?)
        .with_glossary(GlossarySelection::parse(arg(matches, "glossary")?)))
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

fn read_input(path: &str) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))
}

async fn prepare_run(
    settings: &Settings,
    langs: &Languages,
) -> Result<(Backend, TranslateOptions)> {
    let backend = settings.backend()?;
    let opts = settings.translate_options(&backend, langs).await?;
    info!(
        provider = backend.translator().provider_name(),
        "{} -> {}",
        opts.source_lang,
        opts.target_lang
    );
    Ok((backend, opts))
}

async fn run_template(matches: &ArgMatches, mock: bool) -> Result<()> {
    let settings = Settings::from_env(mock)?;
    let langs = languages(matches)?;
    let input = arg(matches, "input")?;
    let output = Path::new(arg(matches, "output")?);

    let source = read_input(input)?;
    let (backend, opts) = prepare_run(&settings, &langs).await?;
    let translated = pipeline::translate_template(backend.translator(), &source, &opts)
        .await
        .with_context(|| format!("Failed to translate template {}", input))?;

    write_output(output, &translated)?;
    println!("Wrote {}", output.display());
    Ok(())
}

async fn run_html(matches: &ArgMatches, mock: bool) -> Result<()> {
    let settings = Settings::from_env(mock)?;
    let langs = languages(matches)?;
    let input = arg(matches, "input")?;
    let output = Path::new(arg(matches, "output")?);

    let html = read_input(input)?;
    let (backend, opts) = prepare_run(&settings, &langs).await?;
    let translated = pipeline::translate_html(backend.translator(), &html, &opts)
        .await
        .with_context(|| format!("Failed to translate {}", input))?;

    write_output(output, &translated)?;
    println!("Wrote {}", output.display());
    Ok(())
}

async fn run_pdf(matches: &ArgMatches, mock: bool) -> Result<()> {
    let settings = Settings::from_env(mock)?;
    let langs = languages(matches)?;
    let folder = PathBuf::from(arg(matches, "folder")?);
    let file = matches.get_one::<String>("file").map(String::as_str);

    let pdf_in = pdf::find_input_pdf(&folder, file)?;
    let pdf_out = pdf::translated_pdf_path(&pdf_in, &langs.target);

    let (backend, opts) = prepare_run(&settings, &langs).await?;
    pdf::translate_pdf(backend.translator(), &pdf_in, &pdf_out, &opts)
        .await
        .with_context(|| format!("Failed to translate {}", pdf_in.display()))?;

    println!("Wrote {}", pdf_out.display());
    Ok(())
}

async fn run_render(matches: &ArgMatches, mock: bool) -> Result<()> {
    let translate = matches.get_flag("translate");
    // only translation needs credentials
    let settings = if translate {
        Some(Settings::from_env(mock)?)
    } else {
        None
    };
    let langs = languages(matches)?;

    let templates_dir = PathBuf::from(arg(matches, "templates-dir")?);
    let template = arg(matches, "template")?;
    let outdir = PathBuf::from(arg(matches, "outdir")?);
    let data = matches.get_one::<String>("data").map(PathBuf::from);

    // 1. Render template -> source language HTML
    let context = render::load_context(data.as_deref())?;
    let rendered = render::render_template(&templates_dir, template, &context)
        .with_context(|| format!("Failed to render {}", template))?;
    let src_html = outdir.join("rendered_src.html");
    write_output(&src_html, &rendered)?;
    println!("Rendered HTML → {}", src_html.display());

    // 2. Optionally translate the rendered HTML
    let (html_for_pdf, pdf_name) = match &settings {
        Some(settings) => {
            let (backend, opts) = prepare_run(settings, &langs).await?;
            let translated = pipeline::translate_html(backend.translator(), &rendered, &opts)
                .await
                .context("Failed to translate rendered HTML")?;
            let suffix = langs.target.to_lowercase();
            let tgt_html = outdir.join(format!("rendered_{}.html", suffix));
            write_output(&tgt_html, &translated)?;
            println!("Translated HTML → {}", tgt_html.display());
            (tgt_html, format!("rendered_{}.pdf", suffix))
        }
        None => (src_html, "rendered_src.pdf".to_string()),
    };

    // 3. HTML -> PDF
    let pdf_path = outdir.join(pdf_name);
    match pdf::render_pdf(&html_for_pdf, &pdf_path) {
        Ok(()) => println!("PDF → {}", pdf_path.display()),
        Err(MtError::RenderError(msg)) => {
            warn!("{}", msg);
            println!(
                "PDF skipped; you can still open the HTML in a browser: {}",
                html_for_pdf.display()
            );
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn run_glossary(matches: &ArgMatches, mock: bool) -> Result<()> {
    let settings = Settings::from_env(mock)?;
    let backend = settings.backend()?;
    let csv_url = sheet::sheet_csv_url(arg(matches, "sheet-url")?)?;
    let out_dir = PathBuf::from(arg(matches, "out")?);
    let prefix = arg(matches, "prefix")?;

    info!("Fetching CSV from {}", csv_url);
    let csv_text = sheet::fetch_csv(&csv_url)
        .await
        .context("Error fetching CSV")?;
    let rows = sheet::read_rows(&csv_text)?;
    let present = sheet::present_languages(&rows)?;
    let directions = sheet::directions(&present, matches.get_flag("all-directions"));

    let Some(store) = backend.glossary_store() else {
        warn!("Mock backend has no glossary store; saving local CSVs only");
        for (src, tgt) in &directions {
            let (Some(src_col), Some(tgt_col)) =
                (sheet::language_column(src), sheet::language_column(tgt))
            else {
                continue;
            };
            let pairs = sheet::build_pairs(&rows, src_col, tgt_col);
            if !pairs.is_empty() {
                let path = sheet::save_pairs_csv(&pairs, src, tgt, &out_dir)?;
                println!("Saved {}", path.display());
            }
        }
        return Ok(());
    };

    let synced = sheet::sync_glossaries(store, &rows, &directions, prefix, &out_dir).await?;
    if synced.is_empty() {
        println!("No glossaries created or updated (no valid pairs found).");
    } else {
        println!("Glossaries ready:");
        for g in &synced {
            println!(
                " - {} [{}->{}] id={} ({} entries)",
                g.name, g.source_lang, g.target_lang, g.glossary_id, g.entry_count
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    let mock = matches.get_flag("mock");
    let verbose = matches.get_flag("verbose");

    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match matches.subcommand() {
        Some(("template", sub)) => run_template(sub, mock).await,
        Some(("html", sub)) => run_html(sub, mock).await,
        Some(("pdf", sub)) => run_pdf(sub, mock).await,
        Some(("render", sub)) => run_render(sub, mock).await,
        Some(("glossary", sub)) => run_glossary(sub, mock).await,
        _ => unreachable!("subcommand_required"),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            match e.downcast_ref::<MtError>() {
                Some(MtError::ConfigError(_)) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}
