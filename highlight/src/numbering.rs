use crate::redact::CoveredRegion;
use image::{Rgb, RgbImage};
use image_proc::{LABEL_COLOR, LabelFont, draw_bitmap_digits_mut};

/// Smallest label size, in pixels, regardless of region size.
pub const MIN_LABEL_SIZE: f32 = 12.0;
/// Labels never start closer than this to the region's top-left corner.
pub const LABEL_INSET: i32 = 2;
/// Offset from the center used by the fontless fallback.
pub const FALLBACK_OFFSET: (i32, i32) = (5, 10);

/// `max(12, min(width, height) / 2)`.
pub fn label_size(width: i32, height: i32) -> f32 {
    let half = (width.min(height).max(0) / 2) as f32;
    half.max(MIN_LABEL_SIZE)
}

/// Top-left corner that centers a `(width, height)` extent on the region,
/// pushed right/down so it starts at least [`LABEL_INSET`] inside it.
fn centered_origin(region: &CoveredRegion, extent: (f32, f32)) -> (i32, i32) {
    let (cx, cy) = region.center;
    let (text_w, text_h) = extent;
    let x = (cx - (text_w / 2.0).floor() as i32).max(cx - region.width / 2 + LABEL_INSET);
    let y = (cy - (text_h / 2.0).floor() as i32).max(cy - region.height / 2 + LABEL_INSET);
    (x, y)
}

/// Where and how large one label is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPlacement {
    pub text: String,
    pub x: i32,
    pub y: i32,
    /// `None` when drawn with the built-in bitmap digits.
    pub size: Option<f32>,
}

/// Writes 1-based sequence numbers into covered regions.
#[derive(Debug, Clone)]
pub struct NumberingOverlay {
    font: Option<LabelFont>,
    color: Rgb<u8>,
}

impl NumberingOverlay {
    /// Overlay drawing blue labels with `font`, or with the built-in
    /// bitmap digits when `font` is `None`.
    pub fn new(font: Option<LabelFont>) -> Self {
        Self {
            font,
            color: LABEL_COLOR,
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Font used for labels, if one was loaded.
    pub fn font(&self) -> Option<&LabelFont> {
        self.font.as_ref()
    }

    /// Placement of the label for `index` (1-based) in `region`.
    ///
    /// # Parameters
    /// - `index`: sequence number written into the region.
    /// - `region`: covered block the label belongs to.
    ///
    /// # Returns
    /// Text, origin and pixel size. With a font the label is centered and
    /// sized from the region; without one it sits at a fixed offset from
    /// the center and `size` is `None`.
    pub fn place(&self, index: usize, region: &CoveredRegion) -> LabelPlacement {
        let text = index.to_string();
        let (cx, cy) = region.center;

        let Some(font) = &self.font else {
            return LabelPlacement {
                text,
                x: cx - FALLBACK_OFFSET.0,
                y: cy - FALLBACK_OFFSET.1,
                size: None,
            };
        };

        let size = label_size(region.width, region.height);
        let (x, y) = centered_origin(region, font.measure(&text, size));

        LabelPlacement {
            text,
            x,
            y,
            size: Some(size),
        }
    }

    /// Draw labels `1..=regions.len()` in order. Returns how many were drawn.
    pub fn apply(&self, image: &mut RgbImage, regions: &[CoveredRegion]) -> usize {
        for (i, region) in regions.iter().enumerate() {
            let LabelPlacement { text, x, y, size } = self.place(i + 1, region);
            match (&self.font, size) {
                (Some(font), Some(size)) => font.draw_mut(image, &text, x, y, size, self.color),
                _ => draw_bitmap_digits_mut(image, &text, x, y, self.color),
            }
        }
        regions.len()
    }
}
