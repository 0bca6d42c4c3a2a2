//! OCR front end for the workspace: engine backends and the word-box model.
//!
//! Engines produce an [`OcrPage`] (whole-image text plus raw tokens, noise
//! included). [`OcrPage::word_boxes`] is the single place where tokens are
//! filtered into [`WordBox`]es; everything downstream works on that typed
//! sequence. The default backend shells out to Tesseract; the `paddle`
//! feature adds a PP-OCR backend.

mod config;
mod engine;
#[cfg(feature = "paddle")]
mod paddle;
mod result;
mod tsv;

pub use config::OcrOptions;
pub use engine::{OcrBackend, TesseractEngine, recognize_image};
#[cfg(feature = "paddle")]
pub use paddle::{PaddleEngine, PaddleModels, PaddleTuning};
pub use result::{BoundingBox, OcrColumns, OcrPage, RawToken, WordBox};
pub use tsv::parse_tsv;

/// Crate-wide result type.
pub type OcrResult<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::{BoundingBox, OcrOptions};
    use imageproc::rect::Rect;

    #[test]
    fn bounding_box_converts_from_rect() {
        let rect = Rect::at(5, 10).of_size(20, 30);
        let bbox: BoundingBox = rect.into();
        assert_eq!(bbox.x, 5);
        assert_eq!(bbox.y, 10);
        assert_eq!(bbox.width, 20);
        assert_eq!(bbox.height, 30);
    }

    #[test]
    fn bounding_box_clamps_negative_rect_origin() {
        let bbox: BoundingBox = Rect::at(-3, -1).of_size(4, 4).into();
        assert_eq!((bbox.x, bbox.y), (0, 0));
    }

    #[test]
    fn options_apply_defaults() {
        let opts = OcrOptions::default();
        assert_eq!(opts.language, "eng");
        assert!(opts.page_segmentation.is_none());
        assert_eq!(opts.common_args(), ["-l", "eng"]);
    }

    #[test]
    fn options_forward_segmentation_mode() {
        let opts = OcrOptions::default()
            .with_language("por")
            .with_page_segmentation(Some(11));
        assert_eq!(opts.common_args(), ["-l", "por", "--psm", "11"]);
    }

    #[test]
    fn options_forward_engine_mode() {
        let opts = OcrOptions::default()
            .with_page_segmentation(Some(6))
            .with_engine_mode(Some(1));
        assert_eq!(opts.common_args(), ["-l", "eng", "--psm", "6", "--oem", "1"]);
        assert_eq!(opts.with_engine_mode(None).common_args(), ["-l", "eng", "--psm", "6"]);
    }
}
