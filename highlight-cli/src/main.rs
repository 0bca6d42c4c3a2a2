mod batch;
mod config;
mod logging;
mod prompt;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use highlight::{ERASE_MIN_CONFIDENCE, HIGHLIGHT_MIN_CONFIDENCE, Highlighter, NumberingOverlay};
use image_proc::{LabelFont, TextMetrics, default_font_candidates};
use ocr::{OcrBackend, OcrOptions, TesseractEngine};
use tracing::{error, info, warn};

use crate::batch::{HighlightJob, run_erase, run_highlight, validate_folder};
use crate::config::{Mode, RunConfig, load_config, load_keywords_file};

/// Highlight, cover and number keywords found by OCR in folders of images.
#[derive(Parser, Debug)]
#[command(name = "image-highlight", version, about)]
struct Cli {
    /// JSON run configuration; command-line values take precedence
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for image_processing.log
    #[arg(long, global = true, default_value = ".")]
    log_dir: PathBuf,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Path to the tesseract executable
    #[arg(long, global = true)]
    tesseract: Option<PathBuf>,

    /// Tesseract language pack, e.g. `eng` or `por`
    #[arg(long, global = true)]
    lang: Option<String>,

    /// Tesseract page segmentation mode
    #[arg(long, global = true)]
    psm: Option<u8>,

    /// Tesseract OCR engine mode (0 legacy, 1 LSTM, 2 both, 3 default)
    #[arg(long, global = true)]
    oem: Option<u8>,

    /// TrueType font for sequence numbers
    #[arg(long, global = true)]
    font: Option<PathBuf>,

    /// Label measuring strategy: exact, bounding-box or heuristic
    #[arg(long, global = true)]
    label_metrics: Option<TextMetrics>,

    /// Directory with PP-OCRv5 models; selects PaddleOCR instead of Tesseract
    #[cfg(feature = "paddle")]
    #[arg(long, global = true)]
    paddle_models: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Outline or cover keyword occurrences
    Highlight(HighlightArgs),
    /// Cover every piece of recognized text
    Erase(EraseArgs),
}

#[derive(Args, Debug)]
struct HighlightArgs {
    /// Folder with the source images; asked for when omitted
    folder: Option<PathBuf>,

    /// Word or phrase to highlight (repeatable)
    #[arg(short, long = "keyword")]
    keywords: Vec<String>,

    /// File with one keyword per line
    #[arg(long)]
    keywords_file: Option<PathBuf>,

    /// visible, cover, or both (answer key plus exam)
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Number covered regions 1, 2, 3...
    #[arg(long)]
    number: bool,

    /// Delete outputs of images where no keyword was found
    #[arg(long)]
    delete_unmatched: bool,
}

#[derive(Args, Debug)]
struct EraseArgs {
    /// Folder with the source images; asked for when omitted
    folder: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init_logging(&cli.log_dir, &cli.log_level)?;

    if let Err(err) = run(cli) {
        error!("{err:#}");
        return Err(err);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let cfg = match &cli.config {
        Some(path) => load_config(path)?,
        None => RunConfig::default(),
    };

    let engine = start_backend(&cli, &cfg)?;

    match &cli.command {
        Command::Highlight(args) => {
            let folder = resolve_folder(args.folder.clone())?;
            let keywords = resolve_keywords(args, &cfg)?;
            let job = HighlightJob {
                folder,
                keywords,
                mode: args.mode.or(cfg.mode).unwrap_or_default(),
                number: args.number || cfg.number,
                delete_unmatched: args.delete_unmatched || cfg.delete_unmatched,
                min_confidence: cfg.min_confidence.unwrap_or(HIGHLIGHT_MIN_CONFIDENCE),
            };
            let overlay = NumberingOverlay::new(load_font(&cli, &cfg));
            let mut highlighter = Highlighter::new(engine, overlay);
            run_highlight(&mut highlighter, &job)?;
        }
        Command::Erase(args) => {
            let folder = resolve_folder(args.folder.clone())?;
            let mut engine = engine;
            let min_confidence = cfg.erase_min_confidence.unwrap_or(ERASE_MIN_CONFIDENCE);
            run_erase(&mut engine, &folder, min_confidence)?;
        }
    }
    Ok(())
}

fn start_backend(cli: &Cli, cfg: &RunConfig) -> Result<Box<dyn OcrBackend>> {
    #[cfg(feature = "paddle")]
    if let Some(dir) = &cli.paddle_models {
        let models = ocr::PaddleModels::from_dir(dir);
        let engine = ocr::PaddleEngine::load(models, ocr::PaddleTuning::default())
            .context("failed to load PaddleOCR models")?;
        info!(models = %dir.display(), "PaddleOCR ready");
        return Ok(Box::new(engine));
    }
    Ok(Box::new(start_tesseract(cli, cfg)?))
}

fn start_tesseract(cli: &Cli, cfg: &RunConfig) -> Result<TesseractEngine> {
    let mut options = OcrOptions::default();
    if let Some(binary) = cli.tesseract.as_ref().or(cfg.tesseract.as_ref()) {
        options = options.with_binary(binary);
    }
    if let Some(lang) = cli.lang.as_ref().or(cfg.language.as_ref()) {
        options = options.with_language(lang.clone());
    }
    options = options
        .with_page_segmentation(cli.psm.or(cfg.page_segmentation))
        .with_engine_mode(cli.oem.or(cfg.engine_mode));

    let engine = TesseractEngine::with_options(options)
        .context("failed to start Tesseract OCR; check that it is installed correctly")?;
    info!(version = engine.version(), "Tesseract ready");
    Ok(engine)
}

fn resolve_folder(folder: Option<PathBuf>) -> Result<PathBuf> {
    let folder = match folder {
        Some(folder) => {
            validate_folder(&folder)?;
            folder
        }
        None => {
            let stdin = io::stdin();
            prompt::prompt_folder(&mut stdin.lock(), &mut io::stdout(), |p| validate_folder(p))?
        }
    };
    info!(folder = %folder.display(), "folder accepted");
    Ok(folder)
}

/// Command line first, then the config file, then an interactive prompt.
fn resolve_keywords(args: &HighlightArgs, cfg: &RunConfig) -> Result<Vec<String>> {
    let mut keywords = args.keywords.clone();
    if let Some(path) = &args.keywords_file {
        keywords.extend(load_keywords_file(path)?);
    }
    if keywords.is_empty() {
        keywords = cfg.keywords.clone();
    }
    if keywords.is_empty() {
        let stdin = io::stdin();
        keywords = prompt::prompt_keywords(&mut stdin.lock(), &mut io::stdout())?;
    }

    keywords.retain(|k| !k.trim().is_empty());
    if keywords.is_empty() {
        bail!("no keywords given");
    }
    info!(keywords = ?keywords, "keywords to highlight");
    Ok(keywords)
}

/// Explicit font first, then well-known system fonts. `None` selects the
/// built-in digits.
fn load_font(cli: &Cli, cfg: &RunConfig) -> Option<LabelFont> {
    let explicit = cli.font.as_ref().or(cfg.font.as_ref());
    let font = match explicit.map(|path| LabelFont::load(path)) {
        Some(Ok(font)) => Some(font),
        Some(Err(err)) => {
            warn!("{err:#}; trying system fonts");
            discover_system_font()
        }
        None => discover_system_font(),
    }?;

    let font = match cli.label_metrics.or(cfg.label_metrics) {
        Some(metrics) => font.with_metrics(metrics),
        None => font,
    };
    info!(font = %font.source().display(), metrics = %font.metrics(), "label font loaded");
    Some(font)
}

fn discover_system_font() -> Option<LabelFont> {
    let font = LabelFont::discover(default_font_candidates());
    if font.is_none() {
        warn!("no system font found among {:?}", candidate_names());
    }
    font
}

fn candidate_names() -> Vec<String> {
    default_font_candidates()
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect()
}
