use crate::context::ProcessingContext;
use crate::matcher::scan;
use crate::numbering::NumberingOverlay;
use crate::redact::RegionRedactor;
use crate::report::ImageReport;
use anyhow::{Context, Result, ensure};
use image::RgbImage;
use image_proc::{flatten_to_rgb, save_image};
use ocr::{OcrBackend, OcrPage};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Decode an image file into RGB, compositing any alpha onto white.
pub fn load_rgb(path: &Path) -> Result<RgbImage> {
    let image = image::open(path).with_context(|| format!("failed to open image {}", path.display()))?;
    Ok(flatten_to_rgb(&image))
}

/// Match the page against the context's phrases and paint the results onto
/// `image`.
///
/// When no phrase passes the whole-text check the image is left untouched.
pub fn highlight_image(
    image: &mut RgbImage,
    page: &OcrPage,
    ctx: &ProcessingContext,
    overlay: &NumberingOverlay,
) -> ImageReport {
    let words = page.word_boxes(ctx.min_confidence());
    let outcome = scan(&page.full_text, &words, ctx.phrases());
    if !outcome.keyword_present {
        return ImageReport::no_keyword();
    }

    let covered = RegionRedactor::new(ctx.cover()).apply(image, &outcome.regions);
    if ctx.numbering_enabled() {
        overlay.apply(image, &covered);
    }

    ImageReport::found(outcome.regions.len(), covered.len())
}

/// One rendering of a source image: where it goes and how it is painted.
#[derive(Debug, Clone)]
pub struct OutputPlan {
    pub directory: PathBuf,
    pub context: ProcessingContext,
}

impl OutputPlan {
    pub fn new(directory: impl Into<PathBuf>, context: ProcessingContext) -> Self {
        Self {
            directory: directory.into(),
            context,
        }
    }

    /// Where a rendering of `source` is written.
    pub fn target_for(&self, source: &Path) -> Result<PathBuf> {
        let name = source
            .file_name()
            .with_context(|| format!("{} has no file name", source.display()))?;
        Ok(self.directory.join(name))
    }
}

/// Runs OCR once per image and renders every requested output from it.
pub struct Highlighter<B: OcrBackend> {
    backend: B,
    overlay: NumberingOverlay,
}

impl<B: OcrBackend> Highlighter<B> {
    pub fn new(backend: B, overlay: NumberingOverlay) -> Self {
        Self { backend, overlay }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn overlay(&self) -> &NumberingOverlay {
        &self.overlay
    }

    /// Process one source file into every plan's directory.
    ///
    /// Any decode, OCR or save failure is returned; outputs written before
    /// the failure are left in place.
    pub fn process_file(&mut self, source: &Path, plans: &[OutputPlan]) -> Result<ImageReport> {
        ensure!(!plans.is_empty(), "no outputs requested for {}", source.display());

        let image = load_rgb(source)?;
        let page = self
            .backend
            .recognize_image(&image)
            .with_context(|| format!("{} failed on {}", self.backend.name(), source.display()))?;
        debug!(
            path = %source.display(),
            tokens = page.tokens.len(),
            "ocr complete"
        );

        let mut merged: Option<ImageReport> = None;
        for plan in plans {
            let mut output = image.clone();
            let report = highlight_image(&mut output, &page, &plan.context, &self.overlay);

            let target = plan.target_for(source)?;
            save_image(&output, &target)?;
            debug!(target = %target.display(), covered = report.covered, "output saved");

            merged = Some(match merged {
                None => report,
                Some(prev) => ImageReport {
                    covered: prev.covered.max(report.covered),
                    ..prev
                },
            });
        }

        let report = merged.unwrap_or_default();
        if report.keyword_present {
            info!(
                path = %source.display(),
                occurrences = report.occurrences,
                "keywords highlighted"
            );
        } else {
            info!(path = %source.display(), "no keywords found");
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use image_proc::{ERASE_COLOR, OUTLINE_COLOR};
    use ocr::{BoundingBox, RawToken};

    const INK: Rgb<u8> = Rgb([40, 40, 40]);

    fn page(full_text: &str) -> OcrPage {
        OcrPage::new(
            full_text,
            vec![
                RawToken::new("femur", 90.0, BoundingBox::new(10, 10, 50, 20)),
                RawToken::new("tibia", 25.0, BoundingBox::new(10, 40, 50, 20)),
            ],
        )
    }

    #[test]
    fn low_confidence_words_are_ignored() {
        let mut image = RgbImage::from_pixel(80, 80, INK);
        let ctx = ProcessingContext::from_raw(["tibia"]).with_cover(true);
        let report = highlight_image(&mut image, &page("femur tibia"), &ctx, &NumberingOverlay::new(None));

        assert_eq!(report.decision(), (true, 0, true));
        assert_eq!(*image.get_pixel(35, 50), INK);
    }

    #[test]
    fn failed_gate_leaves_image_untouched() {
        let mut image = RgbImage::from_pixel(80, 80, INK);
        let before = image.clone();
        let ctx = ProcessingContext::from_raw(["patella"]).with_cover(true);
        let report = highlight_image(&mut image, &page("femur tibia"), &ctx, &NumberingOverlay::new(None));

        assert_eq!(report.decision(), (true, 0, false));
        assert_eq!(image, before);
    }

    #[test]
    fn covering_paints_white_inside_red_outline() {
        let mut image = RgbImage::from_pixel(80, 80, INK);
        let ctx = ProcessingContext::from_raw(["femur"]).with_cover(true);
        let report = highlight_image(&mut image, &page("femur"), &ctx, &NumberingOverlay::new(None));

        assert_eq!(report.decision(), (true, 1, true));
        assert_eq!(report.covered, 1);
        assert_eq!(*image.get_pixel(35, 20), ERASE_COLOR);
        assert_eq!(*image.get_pixel(8, 20), OUTLINE_COLOR);
    }

    #[test]
    fn region_far_outside_the_image_is_counted_but_not_painted() {
        let mut image = RgbImage::from_pixel(10, 10, INK);
        let before = image.clone();
        let page = OcrPage::new(
            "femur",
            vec![RawToken::new("femur", 90.0, BoundingBox::new(u32::MAX - 5, 0, 10, 10))],
        );
        let ctx = ProcessingContext::from_raw(["femur"]).with_cover(true).with_number(true);
        let report = highlight_image(&mut image, &page, &ctx, &NumberingOverlay::new(None));

        assert_eq!(report.decision(), (true, 1, true));
        assert_eq!(report.covered, 0);
        assert_eq!(image, before);
    }

    #[test]
    fn plan_targets_keep_the_source_name() {
        let plan = OutputPlan::new("/out/Exam-scans", ProcessingContext::from_raw(["x"]));
        let target = plan.target_for(Path::new("/in/scans/page 1.PNG")).unwrap();
        assert_eq!(target, PathBuf::from("/out/Exam-scans/page 1.PNG"));
    }
}
