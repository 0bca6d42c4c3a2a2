use crate::OcrResult;
use crate::engine::OcrBackend;
use crate::result::{BoundingBox, OcrPage, RawToken};
use anyhow::{Context, ensure};
use image::{DynamicImage, RgbImage};
use imageproc::rect::Rect;
use rust_paddle_ocr::efficient_cropping::{EfficientCropper, ImageRef};
use rust_paddle_ocr::{Det, Rec};
use std::path::{Path, PathBuf};

/// Confidence reported for every recognized line. Lines under the
/// recognizer's `min_score` never reach the page.
pub const ACCEPTED_CONFIDENCE: f32 = 100.0;

/// Model files for PP-OCR detection and recognition.
#[derive(Debug, Clone)]
pub struct PaddleModels {
    pub detection: PathBuf,
    pub recognition: PathBuf,
    pub keys: PathBuf,
}

impl PaddleModels {
    /// PP-OCRv5 mobile models laid out under one directory.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection: dir.join("PP-OCRv5_mobile_det_fp16.mnn"),
            recognition: dir.join("PP-OCRv5_mobile_rec_fp16.mnn"),
            keys: dir.join("ppocr_keys_v5.txt"),
        }
    }

    fn check(&self) -> OcrResult<()> {
        for path in [&self.detection, &self.recognition, &self.keys] {
            ensure!(path.is_file(), "PaddleOCR model file {} not found", path.display());
        }
        Ok(())
    }
}

/// Detection and recognition knobs.
#[derive(Debug, Clone, Copy)]
pub struct PaddleTuning {
    /// Merge neighbouring detections into lines.
    pub merge_boxes: bool,
    pub merge_threshold: i32,
    pub min_score: f32,
    pub punct_min_score: f32,
    pub fast_crop: bool,
}

impl Default for PaddleTuning {
    fn default() -> Self {
        Self {
            merge_boxes: true,
            merge_threshold: 1,
            min_score: 0.6,
            punct_min_score: 0.1,
            fast_crop: true,
        }
    }
}

/// PP-OCR backend. Each detected line becomes one token, so multi-word
/// phrases inside a line match as a single word box.
pub struct PaddleEngine {
    det: Det,
    rec: Rec,
    fast_crop: bool,
}

impl PaddleEngine {
    pub fn load(models: PaddleModels, tuning: PaddleTuning) -> OcrResult<Self> {
        models.check()?;
        let det = Det::from_file(models.detection.as_path())
            .context("failed to load detection model")?
            .with_merge_boxes(tuning.merge_boxes)
            .with_merge_threshold(tuning.merge_threshold);
        let rec = Rec::from_file(models.recognition.as_path(), models.keys.as_path())
            .context("failed to load recognition model")?
            .with_min_score(tuning.min_score)
            .with_punct_min_score(tuning.punct_min_score);
        Ok(Self {
            det,
            rec,
            fast_crop: tuning.fast_crop,
        })
    }
}

fn crop_lines(image: &DynamicImage, rects: &[Rect], fast: bool) -> Vec<DynamicImage> {
    if fast {
        let image_ref = ImageRef::from(image.clone());
        return match rects {
            [single] => vec![EfficientCropper::smart_crop(&image_ref, single)],
            _ if rects.len() <= 8 => EfficientCropper::parallel_batch_crop(&image_ref, rects),
            _ => EfficientCropper::optimized_batch_crop(&image_ref, rects),
        };
    }
    rects
        .iter()
        .map(|r| {
            let b = BoundingBox::from(*r);
            image.crop_imm(b.x, b.y, b.width, b.height)
        })
        .collect()
}

impl OcrBackend for PaddleEngine {
    fn name(&self) -> &'static str {
        "paddle"
    }

    fn recognize_image(&mut self, image: &RgbImage) -> OcrResult<OcrPage> {
        let image = DynamicImage::ImageRgb8(image.clone());
        let rects = self.det.find_text_rect(&image).context("text detection failed")?;
        if rects.is_empty() {
            return Ok(OcrPage::default());
        }
        let crops = crop_lines(&image, &rects, self.fast_crop);

        let mut tokens = Vec::with_capacity(rects.len());
        let mut lines = Vec::with_capacity(rects.len());
        for (rect, crop) in rects.iter().zip(&crops) {
            let text = self.rec.predict_str(crop).context("text recognition failed")?;
            lines.push(text.trim().to_string());
            tokens.push(RawToken::new(text, ACCEPTED_CONFIDENCE, BoundingBox::from(*rect)));
        }

        Ok(OcrPage::new(lines.join("\n"), tokens))
    }
}
