use crate::pipeline::load_rgb;
use anyhow::{Context, Result};
use image::RgbImage;
use image_proc::{ERASE_COLOR, PixelBounds, cover_bounds_mut, save_image};
use ocr::{OcrBackend, OcrPage};
use std::path::Path;
use tracing::info;

/// Cover every recognized word above `min_confidence` with the erase color.
///
/// No outline or numbering is drawn. Returns the number of blocks painted.
pub fn erase_all_text(image: &mut RgbImage, page: &OcrPage, min_confidence: f32) -> usize {
    page.word_boxes(min_confidence)
        .iter()
        .filter_map(|word| {
            let b = word.bbox;
            let bounds = PixelBounds::from_unsigned(b.x, b.y, b.right(), b.bottom());
            cover_bounds_mut(image, bounds, ERASE_COLOR)
        })
        .count()
}

/// Load `source`, erase all text and save it as `target`.
pub fn erase_file<B: OcrBackend>(
    backend: &mut B,
    source: &Path,
    target: &Path,
    min_confidence: f32,
) -> Result<usize> {
    let mut image = load_rgb(source)?;
    let page = backend
        .recognize_image(&image)
        .with_context(|| format!("{} failed on {}", backend.name(), source.display()))?;

    let covered = erase_all_text(&mut image, &page, min_confidence);
    save_image(&image, target)?;
    info!(path = %source.display(), covered, "text erased");
    Ok(covered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ERASE_MIN_CONFIDENCE;
    use image::Rgb;
    use image_proc::OUTLINE_COLOR;
    use ocr::{BoundingBox, RawToken};

    #[test]
    fn erases_every_confident_word_without_outline() {
        let ink = Rgb([0, 0, 0]);
        let mut image = RgbImage::from_pixel(100, 60, ink);
        let page = OcrPage::new(
            "a b c",
            vec![
                RawToken::new("a", 5.0, BoundingBox::new(5, 5, 10, 10)),
                RawToken::new("b", 0.0, BoundingBox::new(30, 5, 10, 10)),
                RawToken::new(" ", 95.0, BoundingBox::new(60, 5, 10, 10)),
                RawToken::new("c", 95.0, BoundingBox::new(5, 30, 10, 10)),
            ],
        );

        let covered = erase_all_text(&mut image, &page, ERASE_MIN_CONFIDENCE);
        assert_eq!(covered, 2);
        assert_eq!(*image.get_pixel(10, 10), ERASE_COLOR);
        assert_eq!(*image.get_pixel(35, 10), ink);
        assert_eq!(*image.get_pixel(65, 10), ink);
        assert_eq!(*image.get_pixel(10, 35), ERASE_COLOR);
        assert!(image.pixels().all(|p| *p != OUTLINE_COLOR));
    }

    #[test]
    fn words_far_outside_the_image_are_skipped() {
        let ink = Rgb([0, 0, 0]);
        let mut image = RgbImage::from_pixel(10, 10, ink);
        let page = OcrPage::new(
            "far",
            vec![RawToken::new("far", 95.0, BoundingBox::new(u32::MAX - 5, 0, 10, 10))],
        );

        assert_eq!(erase_all_text(&mut image, &page, ERASE_MIN_CONFIDENCE), 0);
        assert!(image.pixels().all(|p| *p == ink));
    }
}
