use crate::config::Mode;
use anyhow::{Context, Result, bail, ensure};
use highlight::{BatchSummary, Highlighter, ImageReport, OutputPlan, ProcessingContext, erase_file};
use indicatif::{ProgressBar, ProgressStyle};
use ocr::OcrBackend;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use walkdir::WalkDir;

/// Image extensions accepted in the input folder, compared case-insensitively.
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "tif", "tiff"];

pub fn is_supported_image(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if SUPPORTED_EXTENSIONS.contains(&ext.as_str())
    )
}

/// Supported images directly inside `folder`, sorted by file name.
pub fn list_images(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in WalkDir::new(folder).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("failed to list {}", folder.display()))?;
        if entry.file_type().is_file() && is_supported_image(entry.path()) {
            images.push(entry.into_path());
        }
    }
    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(images)
}

/// The folder must exist, be a directory and hold at least one image.
pub fn validate_folder(folder: &Path) -> Result<()> {
    ensure!(folder.exists(), "the folder {} does not exist", folder.display());
    ensure!(folder.is_dir(), "{} is not a folder", folder.display());
    let images = list_images(folder)?;
    ensure!(
        !images.is_empty(),
        "no supported images ({}) in {}",
        SUPPORTED_EXTENSIONS.join(", "),
        folder.display()
    );
    Ok(())
}

/// Create `<prefix>-<name>` next to `folder` and return its path.
pub fn output_dir(folder: &Path, prefix: &str) -> Result<PathBuf> {
    let folder = fs::canonicalize(folder)
        .with_context(|| format!("failed to resolve {}", folder.display()))?;
    let Some(name) = folder.file_name().and_then(|n| n.to_str()) else {
        bail!("{} has no usable folder name", folder.display());
    };
    let parent = folder.parent().unwrap_or(&folder);
    let target = parent.join(format!("{prefix}-{name}"));
    fs::create_dir_all(&target)
        .with_context(|| format!("failed to create output folder {}", target.display()))?;
    Ok(target)
}

/// Settings for one highlight run over a folder.
#[derive(Debug, Clone)]
pub struct HighlightJob {
    pub folder: PathBuf,
    pub keywords: Vec<String>,
    pub mode: Mode,
    pub number: bool,
    pub delete_unmatched: bool,
    pub min_confidence: f32,
}

impl HighlightJob {
    fn context(&self, cover: bool) -> ProcessingContext {
        ProcessingContext::from_raw(&self.keywords)
            .with_cover(cover)
            .with_number(self.number)
            .with_min_confidence(self.min_confidence)
    }

    /// Output folders and rendering settings for the job's mode. Folders
    /// are created as a side effect.
    pub fn plans(&self) -> Result<Vec<OutputPlan>> {
        let plans = match self.mode {
            Mode::Visible => vec![OutputPlan::new(
                output_dir(&self.folder, "Highlighted")?,
                self.context(false),
            )],
            Mode::Cover => vec![OutputPlan::new(
                output_dir(&self.folder, "Highlighted")?,
                self.context(true),
            )],
            Mode::Both => vec![
                OutputPlan::new(output_dir(&self.folder, "AnswerKey")?, self.context(false)),
                OutputPlan::new(output_dir(&self.folder, "Exam")?, self.context(true)),
            ],
        };
        Ok(plans)
    }
}

fn progress_bar(len: usize) -> Result<ProgressBar> {
    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .context("invalid progress template")?
            .progress_chars("=>-"),
    );
    Ok(bar)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Remove every rendering of `source`. Returns how many files were removed.
pub fn discard_outputs(source: &Path, plans: &[OutputPlan]) -> Result<usize> {
    let mut removed = 0;
    for plan in plans {
        let target = plan.target_for(source)?;
        if target.exists() {
            fs::remove_file(&target)
                .with_context(|| format!("failed to delete {}", target.display()))?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Highlight every image in the job's folder, one at a time.
pub fn run_highlight<B: OcrBackend>(highlighter: &mut Highlighter<B>, job: &HighlightJob) -> Result<BatchSummary> {
    let images = list_images(&job.folder)?;
    let plans = job.plans()?;
    for plan in &plans {
        info!(folder = %plan.directory.display(), "output folder ready");
    }
    info!(count = images.len(), mode = ?job.mode, "processing images");

    let numbering = job.number && job.mode != Mode::Visible;
    if numbering && !highlighter.overlay().has_font() {
        warn!("no usable font found, numbers are drawn with built-in digits");
    }

    let bar = progress_bar(images.len())?;
    let mut summary = BatchSummary::default();

    for source in &images {
        bar.set_message(display_name(source));
        match highlighter.process_file(source, &plans) {
            Ok(report) => {
                summary.record(&report);
                if job.delete_unmatched && report.should_discard() {
                    match discard_outputs(source, &plans) {
                        Ok(_) => {
                            summary.record_deleted();
                            info!(path = %source.display(), "output deleted, no keywords");
                        }
                        Err(err) => error!(path = %source.display(), "{err:#}"),
                    }
                }
            }
            Err(err) => {
                summary.record(&ImageReport::failed());
                error!(path = %source.display(), "{err:#}");
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    for line in summary.lines(job.delete_unmatched) {
        info!("{line}");
    }
    Ok(summary)
}

/// Cover all text in every image of `folder`, writing to `Covered-<folder>`.
pub fn run_erase<B: OcrBackend>(backend: &mut B, folder: &Path, min_confidence: f32) -> Result<BatchSummary> {
    let images = list_images(folder)?;
    let target_dir = output_dir(folder, "Covered")?;
    info!(count = images.len(), folder = %target_dir.display(), "erasing text");

    let bar = progress_bar(images.len())?;
    let mut summary = BatchSummary::default();

    for source in &images {
        bar.set_message(display_name(source));
        let target = target_dir.join(display_name(source));
        match erase_file(backend, source, &target, min_confidence) {
            Ok(covered) => {
                summary.processed += 1;
                summary.occurrences += covered;
            }
            Err(err) => {
                summary.failed += 1;
                error!(path = %source.display(), "{err:#}");
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    info!(
        processed = summary.processed,
        failed = summary.failed,
        covered = summary.occurrences,
        "erase finished"
    );
    Ok(summary)
}
