use crate::OcrResult;
use anyhow::ensure;
use imageproc::rect::Rect;
use serde::Deserialize;

/// Bounding box of a detected text region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Clamp signed engine coordinates to the top-left origin.
    pub fn from_signed(left: i64, top: i64, width: i64, height: i64) -> Self {
        let clamp = |v: i64| v.clamp(0, u32::MAX as i64) as u32;
        Self::new(clamp(left), clamp(top), clamp(width), clamp(height))
    }

    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }
}

impl From<Rect> for BoundingBox {
    fn from(rect: Rect) -> Self {
        let x = rect.left().max(0) as u32;
        let y = rect.top().max(0) as u32;
        Self {
            x,
            y,
            width: rect.width(),
            height: rect.height(),
        }
    }
}

/// One row of engine output, noise tokens included.
#[derive(Debug, Clone, PartialEq)]
pub struct RawToken {
    pub text: String,
    /// Engine score; Tesseract reports -1 for non-word layout rows.
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl RawToken {
    pub fn new(text: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            text: text.into(),
            confidence,
            bbox,
        }
    }
}

/// A recognized word that survived filtering: non-blank and above the
/// confidence threshold. Text is already trimmed.
#[derive(Debug, Clone, PartialEq)]
pub struct WordBox {
    pub text: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl WordBox {
    pub fn new(text: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            text: text.into(),
            confidence,
            bbox,
        }
    }

    pub fn lowercase_text(&self) -> String {
        self.text.to_lowercase()
    }
}

/// Output of one OCR pass over one image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrPage {
    /// Whole-image plain text as the engine reconstructs it.
    pub full_text: String,
    /// Tokens in detection order.
    pub tokens: Vec<RawToken>,
}

impl OcrPage {
    pub fn new(full_text: impl Into<String>, tokens: Vec<RawToken>) -> Self {
        Self {
            full_text: full_text.into(),
            tokens,
        }
    }

    /// Build a page for engines that produce no separate plain-text pass.
    pub fn from_tokens(tokens: Vec<RawToken>) -> Self {
        let full_text = tokens
            .iter()
            .map(|t| t.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self { full_text, tokens }
    }

    /// Filter tokens into word boxes, keeping detection order.
    ///
    /// A token is dropped when its trimmed text is empty or its confidence
    /// is at or below `min_confidence`.
    pub fn word_boxes(&self, min_confidence: f32) -> Vec<WordBox> {
        self.tokens
            .iter()
            .filter(|t| t.confidence > min_confidence)
            .filter_map(|t| {
                let text = t.text.trim();
                (!text.is_empty()).then(|| WordBox::new(text, t.confidence, t.bbox))
            })
            .collect()
    }
}

/// Index-aligned columns as some OCR bindings return them
/// (`pytesseract.image_to_data(..., output_type=DICT)` style JSON dumps).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrColumns {
    pub text: Vec<String>,
    #[serde(alias = "conf")]
    pub confidence: Vec<f32>,
    pub left: Vec<i64>,
    pub top: Vec<i64>,
    pub width: Vec<i64>,
    pub height: Vec<i64>,
}

impl OcrColumns {
    /// Reshape into rows. All columns must have the same length.
    pub fn into_tokens(self) -> OcrResult<Vec<RawToken>> {
        let len = self.text.len();
        ensure!(
            [
                self.confidence.len(),
                self.left.len(),
                self.top.len(),
                self.width.len(),
                self.height.len(),
            ]
            .iter()
            .all(|&l| l == len),
            "OCR columns are not index-aligned ({} text entries)",
            len
        );

        let tokens = self
            .text
            .into_iter()
            .zip(self.confidence)
            .zip(self.left.into_iter().zip(self.top))
            .zip(self.width.into_iter().zip(self.height))
            .map(|(((text, conf), (left, top)), (width, height))| {
                RawToken::new(text, conf, BoundingBox::from_signed(left, top, width, height))
            })
            .collect();
        Ok(tokens)
    }
}
